use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub url: String,
    pub public_id: String,
}

/// Injected object-storage/CDN capability. Image handlers depend on this
/// trait only; failures propagate as upstream errors.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: Vec<u8>, folder: &str, public_id: &str)
    -> AppResult<UploadedFile>;
}

/// HTTP client for the image CDN's upload endpoint.
pub struct CdnClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CdnUploadResponse {
    url: String,
    public_id: String,
}

impl CdnClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Uploader for CdnClient {
    async fn upload(
        &self,
        file: Vec<u8>,
        folder: &str,
        public_id: &str,
    ) -> AppResult<UploadedFile> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(file).file_name(public_id.to_string()))
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string());

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "upload rejected with status {}",
                response.status()
            )));
        }

        let body: CdnUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid upload response: {e}")))?;

        Ok(UploadedFile {
            url: body.url,
            public_id: body.public_id,
        })
    }
}

/// Stand-in used when no CDN is configured; file-bearing requests fail with
/// an upstream error instead of a panic.
pub struct UploadDisabled;

#[async_trait]
impl Uploader for UploadDisabled {
    async fn upload(
        &self,
        _file: Vec<u8>,
        _folder: &str,
        _public_id: &str,
    ) -> AppResult<UploadedFile> {
        Err(AppError::Upstream("file upload is not configured".into()))
    }
}
