//! Thin HTTP client for the local API, backing the status and recordings
//! subcommands.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    phase: String,
    message: String,
    uptime_seconds: Option<u64>,
    last_trigger: Option<String>,
    last_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordingsResponse {
    count: usize,
    recordings: Vec<Value>,
}

fn base_url() -> Result<String> {
    let config = Config::load()?;
    Ok(format!("http://127.0.0.1:{}", config.api.port))
}

pub async fn handle_status_command() -> Result<()> {
    let url = format!("{}/monitor/status", base_url()?);
    let status: StatusResponse = reqwest::get(&url)
        .await
        .context("Is the vigil service running?")?
        .json()
        .await?;

    println!("Phase:   {}", status.phase);
    println!("Status:  {}", status.message);
    if let Some(uptime) = status.uptime_seconds {
        println!("Uptime:  {}s", uptime);
    }
    if let Some(trigger) = status.last_trigger {
        println!("Last trigger: {}", trigger);
    }
    if let Some(error) = status.last_error {
        println!("Error:   {}", error);
    }

    Ok(())
}

pub async fn handle_recordings_command() -> Result<()> {
    let url = format!("{}/recordings", base_url()?);
    let response: RecordingsResponse = reqwest::get(&url)
        .await
        .context("Is the vigil service running?")?
        .json()
        .await?;

    if response.count == 0 {
        println!("No recordings.");
        return Ok(());
    }

    println!("{} recording(s):", response.count);
    for recording in response.recordings {
        let id = recording["id"].as_str().unwrap_or("?");
        let timestamp = recording["timestamp"].as_str().unwrap_or("?");
        let cloud = recording["cloud_status"].as_str().unwrap_or("?");
        let frames = recording["frames"].as_u64().unwrap_or(0);
        let analyzed = if recording["analysis"].is_string() {
            "analyzed"
        } else {
            "not analyzed"
        };
        println!("  {id}  {timestamp}  {frames} frames  cloud:{cloud}  {analyzed}");
    }

    Ok(())
}
