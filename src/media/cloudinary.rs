//! Cloudinary media store.
//!
//! Uses the signed REST upload API:
//!
//! - `POST {base}/{cloud}/image/upload` with `file`, `folder`, `timestamp`,
//!   `api_key`, `signature`
//! - `POST {base}/{cloud}/image/destroy` with `public_id`, `timestamp`,
//!   `api_key`, `signature`
//!
//! The signature is the hex SHA-256 of the signed parameters, sorted by name
//! and joined as `k=v&k=v`, followed by the API secret.

use super::{MediaFile, MediaStore};
use crate::error::{Error, Result};
use crate::models::Photo;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder new assets are stored in.
    pub folder: String,
    pub timeout: Duration,
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        CloudinaryConfig {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "upload".to_string(),
            timeout: Duration::from_secs(30),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.api_base.trim_end_matches('/'),
            self.cloud_name,
            action
        )
    }
}

/// Hex SHA-256 request signature over `params`.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);

    let to_sign = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct CloudinaryMediaStore {
    client: Client,
    config: Arc<CloudinaryConfig>,
}

impl CloudinaryMediaStore {
    /// # Errors
    /// Returns `Error::ConfigError` if a credential is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(Error::ConfigError(
                "Cloudinary cloud name, API key and API secret are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "✓ Cloudinary media store initialized (cloud: {}, folder: {})",
            config.cloud_name, config.folder
        );

        Ok(CloudinaryMediaStore {
            client,
            config: Arc::new(config),
        })
    }

    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let timestamp = Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, &str)> = params.to_vec();
        signed.push(("timestamp", timestamp.as_str()));
        let signature = sign(&signed, &self.config.api_secret);

        let mut form = Form::new();
        for (name, value) in signed {
            form = form.text(name.to_string(), value.to_string());
        }
        form.text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.config.endpoint(action))
            .multipart(form)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.to_string(),
        };
        Err(Error::UpstreamError(format!(
            "Cloudinary {} failed ({}): {}",
            action,
            status.as_u16(),
            message
        )))
    }
}

impl MediaStore for CloudinaryMediaStore {
    async fn store_one(&self, file: &MediaFile) -> Result<Photo> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;

        let form = self
            .signed_form(&[("folder", self.config.folder.as_str())])
            .part("file", part);

        let uploaded: UploadResponse = self.send("upload", form).await?.json().await?;
        debug!("Uploaded {} as {}", file.file_name, uploaded.public_id);

        Ok(Photo {
            id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn remove_one(&self, id: &str) -> Result<()> {
        let form = self.signed_form(&[("public_id", id)]);
        let destroyed: DestroyResponse = self.send("destroy", form).await?.json().await?;

        if destroyed.result == "ok" {
            debug!("Destroyed {}", id);
            Ok(())
        } else {
            Err(Error::UpstreamError(format!(
                "Cloudinary destroy of {}: {}",
                id, destroyed.result
            )))
        }
    }
}
