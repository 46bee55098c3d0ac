use crate::error::AppError;
use async_trait::async_trait;
use base64::Engine;
use std::path::PathBuf;
use url::Url;

/// Reads a picked file as base64 text.
#[async_trait]
pub trait FileAccess: Send + Sync {
    async fn read_as_base64(&self, uri: &str) -> Result<String, AppError>;
}

/// Reads from the local filesystem. Accepts plain paths and `file://` URIs.
pub struct LocalFileAccess;

#[async_trait]
impl FileAccess for LocalFileAccess {
    async fn read_as_base64(&self, uri: &str) -> Result<String, AppError> {
        let path = resolve_path(uri)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            AppError::Decode(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
    }
}

pub fn resolve_path(uri: &str) -> Result<PathBuf, AppError> {
    if uri.trim().is_empty() {
        return Err(AppError::Decode("Empty image reference".to_string()));
    }

    if !uri.starts_with("file:") {
        return Ok(PathBuf::from(uri));
    }

    let url = Url::parse(uri)
        .map_err(|e| AppError::Decode(format!("Invalid file URI {}: {}", uri, e)))?;
    url.to_file_path()
        .map_err(|_| AppError::Decode(format!("URI does not name a local file: {}", uri)))
}
