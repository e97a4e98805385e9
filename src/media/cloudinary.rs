//! Cloudinary upload API client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::{extension_for, MediaError, MediaHost, MediaKind, UploadRequest, UploadedMedia};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

pub struct CloudinaryHost {
    config: CloudinaryConfig,
    client: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// SHA-256 signature over the `&`-joined, key-sorted parameters followed by
/// the API secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MediaError::Upstream(e.to_string()))?;
        Ok(Self {
            config,
            client,
            api_base: API_BASE.to_string(),
        })
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base,
            self.config.cloud_name,
            kind.as_str(),
            action
        )
    }

    /// Signed parameters plus the credentials Cloudinary expects with them.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        let signature = sign(&params, &self.config.api_secret);
        params.retain(|(_, v)| !v.is_empty());
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }

    async fn read_error(response: reqwest::Response) -> MediaError {
        let status = response.status();
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => "unreadable error body".to_string(),
        };
        MediaError::Upstream(format!("{}: {}", status, message))
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadedMedia, MediaError> {
        let file_name = request
            .file_name
            .clone()
            .unwrap_or_else(|| format!("upload.{}", extension_for(&request)));

        let params = self.signed(vec![
            ("folder", request.folder.clone()),
            ("public_id", request.public_id.clone().unwrap_or_default()),
            (
                "overwrite",
                if request.public_id.is_some() {
                    request.overwrite.to_string()
                } else {
                    String::new()
                },
            ),
        ]);

        let mut part = Part::bytes(request.bytes.to_vec()).file_name(file_name);
        if let Some(content_type) = &request.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaError::Rejected(format!("Invalid content type: {}", e)))?;
        }
        let form = params
            .into_iter()
            .fold(Form::new(), |form, (k, v)| form.text(k, v))
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint(request.kind, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upstream(format!("invalid upload response: {}", e)))?;

        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
            kind: request.kind,
            duration: body.duration,
            format: body.format,
            overwrite: request.overwrite,
        })
    }

    async fn destroy(&self, media: &UploadedMedia) -> Result<(), MediaError> {
        let params = self.signed(vec![("public_id", media.public_id.clone())]);

        let response = self
            .client
            .post(self.endpoint(media.kind, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upstream(format!("invalid destroy response: {}", e)))?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Upstream(format!("destroy returned '{}'", other))),
        }
    }
}
