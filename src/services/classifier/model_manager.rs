use crate::config::ModelConfig;
use crate::error::AppError;
use futures::StreamExt;
use std::path::Path;
use tracing::{debug, info, warn};

const MAX_LABELS: usize = 1 << 20;

/// Keeps the classifier's weights and label table on disk.
#[derive(Clone)]
pub struct ModelManager {
    config: ModelConfig,
}

impl ModelManager {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_downloaded(&self) -> bool {
        self.config.model_path().exists() && self.config.labels_path().exists()
    }

    /// Fetches whichever of the two files is missing. Without a URL for it the load fails.
    pub async fn ensure_downloaded(&self) -> Result<(), AppError> {
        if self.is_downloaded() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.model_dir)
            .await
            .map_err(|e| AppError::ModelLoad(format!("Failed to create model directory: {}", e)))?;

        let files = [
            (self.config.labels_path(), self.config.labels_url.as_deref()),
            (self.config.model_path(), self.config.model_url.as_deref()),
        ];

        for (path, url) in files {
            if path.exists() {
                continue;
            }
            let url = url.ok_or_else(|| {
                AppError::ModelLoad(format!(
                    "{} is missing and no download URL is configured",
                    path.display()
                ))
            })?;
            download_file(url, &path).await?;
        }

        Ok(())
    }

    pub async fn load_labels(&self) -> Result<Vec<String>, AppError> {
        let labels_path = self.config.labels_path();
        let content = tokio::fs::read_to_string(&labels_path).await.map_err(|e| {
            AppError::ModelLoad(format!(
                "Failed to read label file {}: {}",
                labels_path.display(),
                e
            ))
        })?;
        parse_labels(&content)
    }
}

/// Accepts a config with an `id2label` object or a plain array of names.
pub fn parse_labels(content: &str) -> Result<Vec<String>, AppError> {
    let config: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| AppError::ModelLoad(format!("Failed to parse label JSON: {}", e)))?;

    if let Some(list) = config.as_array() {
        return list
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::ModelLoad(format!("Label {} is not a string", v)))
            })
            .collect();
    }

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| AppError::ModelLoad("Config missing id2label field".to_string()))?;

    let entries: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| -> Result<(usize, String), AppError> {
            let idx = k
                .parse::<usize>()
                .map_err(|_| AppError::ModelLoad(format!("Label index {:?} is not a number", k)))?;
            let label = v.as_str().unwrap_or("unknown").to_string();
            Ok((idx, label))
        })
        .collect::<Result<_, AppError>>()?;

    let max_idx = entries
        .iter()
        .map(|(idx, _)| *idx)
        .max()
        .ok_or_else(|| AppError::ModelLoad("Label table is empty".to_string()))?;
    if max_idx >= MAX_LABELS {
        return Err(AppError::ModelLoad(format!(
            "Label index {} exceeds the limit of {} classes",
            max_idx, MAX_LABELS
        )));
    }

    // Gaps keep their position so every label stays on its own logit.
    let mut labels: Vec<String> = (0..=max_idx).map(|idx| format!("class_{}", idx)).collect();
    for (idx, label) in entries {
        labels[idx] = label;
    }
    Ok(labels)
}

async fn download_file(url: &str, dest: &Path) -> Result<(), AppError> {
    info!("Downloading {} to {}", url, dest.display());
    let fetch_err = |e: reqwest::Error| AppError::ModelLoad(format!("Failed to download {}: {}", url, e));

    let response = reqwest::get(url).await.map_err(fetch_err)?;
    if !response.status().is_success() {
        return Err(AppError::ModelLoad(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let partial = dest.with_extension("part");
    if let Err(e) = write_partial(response, url, &partial).await {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", partial.display(), cleanup);
            }
        }
        return Err(e);
    }

    tokio::fs::rename(&partial, dest).await.map_err(|e| {
        AppError::ModelLoad(format!("Failed to move {} into place: {}", dest.display(), e))
    })?;
    Ok(())
}

async fn write_partial(response: reqwest::Response, url: &str, partial: &Path) -> Result<(), AppError> {
    let total_size = response.content_length().unwrap_or(0);
    let mut file = tokio::fs::File::create(partial).await.map_err(|e| {
        AppError::ModelLoad(format!("Failed to create file {}: {}", partial.display(), e))
    })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_logged = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AppError::ModelLoad(format!("Failed to download {}: {}", url, e)))?;
        downloaded += chunk.len() as u64;
        tokio::io::AsyncWriteExt::write_all(&mut file, &chunk)
            .await
            .map_err(|e| AppError::ModelLoad(format!("Failed to write to file: {}", e)))?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            if progress >= last_logged + 10 {
                debug!("{}: {}%", url, progress);
                last_logged = progress;
            }
        }
    }
    tokio::io::AsyncWriteExt::flush(&mut file)
        .await
        .map_err(|e| AppError::ModelLoad(format!("Failed to flush file: {}", e)))
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::ModelManager;
    use crate::config::{INPUT_SIZE, TOP_K};
    use crate::error::AppError;
    use crate::services::classifier::backend::OnnxBackend;
    use crate::services::classifier::session::{ModelHandle, ModelLoader};
    use async_trait::async_trait;
    use std::sync::Arc;

    #[async_trait]
    impl ModelLoader for ModelManager {
        async fn load(&self) -> Result<ModelHandle, AppError> {
            self.ensure_downloaded().await?;
            let labels = self.load_labels().await?;

            let model_path = self.config.model_path();
            let intra_threads = self.config.intra_threads;
            let backend = tokio::task::spawn_blocking(move || {
                OnnxBackend::from_file(&model_path, intra_threads)
            })
            .await
            .map_err(|e| AppError::ModelLoad(format!("Failed to spawn model loading task: {}", e)))??;

            Ok(ModelHandle::new(Arc::new(backend), labels, INPUT_SIZE, TOP_K))
        }
    }
}
