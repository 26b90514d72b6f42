/// Event banner uploads
///
/// Banners go to an external image host before the event row is written; the
/// returned URL is stored as-is. [`CloudinaryUploader`] talks to Cloudinary's
/// signed upload API. Tests substitute their own [`ImageUploader`].
///
/// # Signing
///
/// Cloudinary signs the alphabetically sorted `key=value` pairs joined by
/// `&`, with the API secret appended, hashed with SHA-256 and hex encoded.
/// `api_key`, `file` and `signature_algorithm` are not signed.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::UploadConfig;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Error type for banner uploads
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request never got a response
    #[error("Upload transport error: {0}")]
    Transport(String),

    /// The host answered with an error status
    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The host answered 2xx without a usable URL
    #[error("Unexpected upload response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}

/// Image hosting service
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Stores `bytes` and returns the public URL
    async fn upload(&self, bytes: Bytes, content_type: &str) -> Result<String, UploadError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signed uploads to Cloudinary
#[derive(Clone)]
pub struct CloudinaryUploader {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl std::fmt::Debug for CloudinaryUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryUploader")
            .field("endpoint", &self.endpoint)
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl CloudinaryUploader {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        Self::with_base_url(config, CLOUDINARY_API_BASE)
    }

    /// Uploads against an alternate API base, e.g. a local stand-in
    pub fn with_base_url(config: &UploadConfig, base_url: &str) -> Result<Self, UploadError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/image/upload",
                base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        })
    }
}

/// SHA-256 request signature over `params`
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, bytes: Bytes, content_type: &str) -> Result<String, UploadError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );
        let size = bytes.len();

        let file = multipart::Part::bytes(bytes.to_vec())
            .file_name("banner")
            .mime_str(content_type)?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), %message, "Banner upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        let url = body
            .secure_url
            .ok_or_else(|| UploadError::InvalidResponse("missing secure_url".to_string()))?;

        tracing::info!(size, %url, "Banner uploaded");
        Ok(url)
    }
}
