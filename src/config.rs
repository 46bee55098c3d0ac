use std::path::PathBuf;

/// Number of predictions kept per image.
pub const TOP_K: usize = 3;

/// Square input edge the classifier was trained on.
pub const INPUT_SIZE: u32 = 224;

const DEFAULT_MODEL_FILE: &str = "mobilenetv3_large.onnx";
const DEFAULT_LABELS_FILE: &str = "mobilenetv3_config.json";
const DEFAULT_INTRA_THREADS: usize = 4;

/// Where the classifier weights live and where to fetch them from on first start.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model_dir: PathBuf,
    pub model_file: String,
    pub labels_file: String,
    pub model_url: Option<String>,
    pub labels_url: Option<String>,
    pub intra_threads: usize,
}

impl ModelConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            labels_file: DEFAULT_LABELS_FILE.to_string(),
            model_url: None,
            labels_url: None,
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }

    /// Defaults rooted at `default_dir`, overridable via `PHOTO_LABELER_*` variables.
    pub fn from_env(default_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(
            std::env::var_os("PHOTO_LABELER_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_dir.into()),
        );
        config.model_url = non_empty_var("PHOTO_LABELER_MODEL_URL");
        config.labels_url = non_empty_var("PHOTO_LABELER_LABELS_URL");
        config
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
