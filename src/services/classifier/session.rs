use crate::error::AppError;
use crate::models::classify_types::PredictionSet;
use crate::models::image_types::ImageBuffer;
use crate::services::classifier::backend::InferenceBackend;
use crate::services::classifier::inference;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// A loaded classifier. Cheap to clone; every clone shares the same backend.
#[derive(Clone)]
pub struct ModelHandle {
    backend: Arc<dyn InferenceBackend>,
    labels: Arc<[String]>,
    input_size: u32,
    top_k: usize,
}

impl ModelHandle {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        labels: Vec<String>,
        input_size: u32,
        top_k: usize,
    ) -> Self {
        Self {
            backend,
            labels: labels.into(),
            input_size,
            top_k,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn same_model(&self, other: &ModelHandle) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }
}

/// Produces a model handle, typically by reading weights from disk.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<ModelHandle, AppError>;
}

/// Owns the one model instance of the process.
#[derive(Clone)]
pub struct ClassifierSession {
    loader: Arc<dyn ModelLoader>,
    handle: Arc<OnceCell<ModelHandle>>,
}

impl ClassifierSession {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            handle: Arc::new(OnceCell::new()),
        }
    }

    /// Loads the model on first call; later calls return the same handle.
    pub async fn load(&self) -> Result<ModelHandle, AppError> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let handle = self.loader.load().await?;
                info!(labels = handle.labels().len(), "Model loaded");
                Ok::<_, AppError>(handle)
            })
            .await?;
        Ok(handle.clone())
    }

    pub fn handle(&self) -> Option<ModelHandle> {
        self.handle.get().cloned()
    }
}

/// Classifies one decoded image. Preprocessing and inference run on the blocking pool.
pub async fn classify(handle: &ModelHandle, buffer: ImageBuffer) -> Result<PredictionSet, AppError> {
    inference::validate_shape(&buffer)?;

    let handle = handle.clone();
    let predictions = tokio::task::spawn_blocking(move || {
        let tensor = inference::preprocess_buffer(buffer, handle.input_size)?;
        let logits = handle.backend.run(tensor)?;
        inference::rank_predictions(&logits, &handle.labels, handle.top_k)
    })
    .await
    .map_err(|e| AppError::Inference(format!("Inference task failed: {}", e)))??;

    debug!(top = ?predictions.top(), "classified image");
    Ok(predictions)
}
