use serde::Serialize;

/// Every failure the pipeline can surface to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    #[error("Media library access was not granted")]
    PermissionDenied,

    #[error("Could not read this image: {0}")]
    Decode(String),

    #[error("Model could not be loaded: {0}")]
    ModelLoad(String),

    #[error("Could not classify this image: {0}")]
    Inference(String),
}
