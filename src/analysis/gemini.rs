//! Gemini vision provider for still-frame analysis.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::AnalysisService;
use crate::config::AnalysisConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Fixed prompt sent with every still frame.
const ANALYSIS_PROMPT: &str = "Analyze this security footage frame. Describe what is happening, \
    identify any people or significant objects, and note any unusual activity. Be concise and \
    prioritize security-relevant observations.";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Part {
    InlineData { mime_type: String, data: String },
    Text(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct GeminiAnalysis {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

impl GeminiAnalysis {
    pub fn new(config: &AnalysisConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("GEMINI_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };

        info!("Initialized analysis provider with model: {}", config.model);

        Self {
            client: reqwest::Client::new(),
            model: config.model.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl AnalysisService for GeminiAnalysis {
    async fn analyze(&self, still_jpeg: &[u8]) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("Analysis API key is not configured (set [analysis] api_key or GEMINI_API_KEY)");
        }

        info!("Analyzing still frame ({} bytes)", still_jpeg.len());

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        mime_type: "image/jpeg".to_string(),
                        data: BASE64.encode(still_jpeg),
                    },
                    Part::Text(ANALYSIS_PROMPT.to_string()),
                ],
            }],
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Analysis request failed to send")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!("Analysis request failed ({}): {}", status, message);
            bail!("Analysis request failed ({status}): {message}");
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode analysis response")?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .context("Analysis response contained no text")?;

        info!("Analysis complete: {} chars", text.len());
        Ok(text)
    }
}
