//! HTTP upload provider for cloud sync.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::CloudSync;
use crate::media::MediaHandle;

#[derive(Debug, Serialize)]
struct UploadPayload {
    content: String, // base64 clip bytes
    extension: String,
    frames: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct HttpCloudSync {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCloudSync {
    pub fn new(endpoint: String, api_key: String) -> Self {
        info!("Initialized cloud sync with endpoint: {}", endpoint);
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl CloudSync for HttpCloudSync {
    async fn save(&self, media: &MediaHandle) -> Result<()> {
        info!(
            "Uploading clip: {} bytes, {} frames",
            media.len(),
            media.frame_count()
        );

        let payload = UploadPayload {
            content: BASE64.encode(media.bytes()),
            extension: media.extension().to_string(),
            frames: media.frame_count(),
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Cloud sync request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!("Cloud sync failed ({}): {}", status, message);
            anyhow::bail!("Cloud sync failed ({status}): {message}");
        }

        info!("Clip uploaded");
        Ok(())
    }
}
