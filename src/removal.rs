//! Background-removal adapter.
//!
//! Wraps the remove.bg HTTP API behind [`RemoveBgClient`], which reports an
//! explicit [`RemovalOutcome`] instead of raising: any auth, quota, network,
//! or validation failure becomes `Failed(reason)` and the caller applies the
//! local fallback ([`flip_horizontal`]). The combined [`BackgroundRemover`]
//! therefore always produces an output for decodable input.

use std::io::Cursor;
use std::time::Duration;

use image::ImageFormat;
use reqwest::multipart;
use reqwest::Client;

use crate::config::RemovalConfig;
use crate::error::{Error, Result};

/// Maximum input size accepted by the remove.bg API.
const MAX_API_IMAGE_BYTES: usize = 12 * 1024 * 1024;

/// Result of one external removal call. The client never errors; failures
/// carry the reason so the caller can log it before falling back.
#[derive(Debug)]
pub enum RemovalOutcome {
    /// The API returned image bytes with the background removed.
    Succeeded(Vec<u8>),
    /// The call was not attempted or did not produce usable bytes.
    Failed(String),
}

/// Client for the remove.bg removal endpoint.
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RemoveBgClient {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        });

        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Submit image bytes for background removal.
    ///
    /// Input is validated before any network traffic: empty or oversized
    /// buffers fail immediately.
    pub async fn call(&self, data: &[u8]) -> RemovalOutcome {
        if data.is_empty() {
            return RemovalOutcome::Failed("Empty image buffer provided".to_string());
        }
        if data.len() > MAX_API_IMAGE_BYTES {
            return RemovalOutcome::Failed(
                "Image is too large; the removal API supports images up to 12 MiB".to_string(),
            );
        }

        let part = match multipart::Part::bytes(data.to_vec())
            .file_name("image.jpg")
            .mime_str("image/jpeg")
        {
            Ok(p) => p,
            Err(e) => return RemovalOutcome::Failed(format!("Failed to build upload: {}", e)),
        };
        let form = multipart::Form::new().part("image_file", part);

        let response = match self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return RemovalOutcome::Failed(format!("Removal API request failed: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            return match response.bytes().await {
                Ok(bytes) => RemovalOutcome::Succeeded(bytes.to_vec()),
                Err(e) => {
                    RemovalOutcome::Failed(format!("Failed to read removal API response: {}", e))
                }
            };
        }

        let reason = match status.as_u16() {
            401 => "Invalid removal API key".to_string(),
            402 => "Removal API quota exceeded".to_string(),
            429 => "Removal API rate limit exceeded".to_string(),
            code => {
                let body = response.text().await.unwrap_or_default();
                format!("Removal API returned status {}: {}", code, body)
            }
        };
        RemovalOutcome::Failed(reason)
    }
}

/// Decode image bytes, flip them horizontally, and re-encode as PNG.
///
/// This is the pure local fallback transform; it only fails on
/// undecodable input.
pub fn flip_horizontal(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| Error::processing(format!("Failed to decode image: {}", e)))?;

    let flipped = img.fliph();

    let mut buf = Cursor::new(Vec::new());
    flipped
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| Error::processing(format!("Failed to encode image as PNG: {}", e)))?;

    Ok(buf.into_inner())
}

/// Adapter combining the external client with the local fallback.
pub struct BackgroundRemover {
    client: Option<RemoveBgClient>,
}

impl BackgroundRemover {
    pub fn new(client: Option<RemoveBgClient>) -> Self {
        Self { client }
    }

    /// Build an adapter from configuration. No (or an empty) API key means
    /// fallback-only mode.
    pub fn from_config(config: &RemovalConfig) -> Self {
        let client = config
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(|key| {
                RemoveBgClient::new(
                    config.endpoint.clone(),
                    key.clone(),
                    Duration::from_secs(config.timeout_secs),
                )
            });

        if client.is_none() {
            tracing::info!("No removal API key configured, using local fallback only");
        }

        Self { client }
    }

    /// Remove the background from the given image, returning PNG bytes.
    ///
    /// The external result is flipped horizontally before being returned,
    /// matching the fallback transform. Errors only if the input itself is
    /// undecodable.
    pub async fn remove(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(ref client) = self.client else {
            return flip_horizontal(data);
        };

        match client.call(data).await {
            RemovalOutcome::Succeeded(removed) => match flip_horizontal(&removed) {
                Ok(bytes) => {
                    tracing::debug!("Background removed via external API");
                    Ok(bytes)
                }
                Err(e) => {
                    tracing::warn!("Removal API returned undecodable bytes ({}), falling back", e);
                    flip_horizontal(data)
                }
            },
            RemovalOutcome::Failed(reason) => {
                tracing::warn!("Removal API failed ({}), falling back to local flip", reason);
                flip_horizontal(data)
            }
        }
    }
}
