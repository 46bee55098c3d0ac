use crate::error::AppError;
use ndarray::Array4;

/// Runs the network on one preprocessed NCHW tensor and returns its raw logits.
pub trait InferenceBackend: Send + Sync {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, AppError>;
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxBackend;

#[cfg(feature = "onnx")]
mod onnx {
    use super::InferenceBackend;
    use crate::error::AppError;
    use ndarray::Array4;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Value;
    use std::path::Path;
    use std::sync::Mutex;

    /// ONNX Runtime session. `Session::run` needs `&mut`, so calls are serialized here.
    pub struct OnnxBackend {
        session: Mutex<Session>,
    }

    impl OnnxBackend {
        pub fn from_file(model_path: &Path, intra_threads: usize) -> Result<Self, AppError> {
            let session = Session::builder()
                .map_err(|e| AppError::ModelLoad(format!("Failed to create session builder: {}", e)))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| AppError::ModelLoad(format!("Failed to set optimization level: {}", e)))?
                .with_intra_threads(intra_threads)
                .map_err(|e| AppError::ModelLoad(format!("Failed to set intra threads: {}", e)))?
                .with_execution_providers([
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| AppError::ModelLoad(format!("Failed to register CPU execution provider: {}", e)))?
                .commit_from_file(model_path)
                .map_err(|e| {
                    AppError::ModelLoad(format!(
                        "Failed to load ONNX model {}: {}",
                        model_path.display(),
                        e
                    ))
                })?;

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl InferenceBackend for OnnxBackend {
        fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, AppError> {
            let mut session = self
                .session
                .lock()
                .map_err(|_| AppError::Inference("Model session is poisoned".to_string()))?;

            let input_name = session.inputs()[0].name().to_string();

            let input_tensor = Value::from_array(input)
                .map_err(|e| AppError::Inference(format!("Failed to create tensor value: {}", e)))?;

            let outputs = session
                .run(ort::inputs![input_name.as_str() => input_tensor])
                .map_err(|e| AppError::Inference(format!("Inference failed: {}", e)))?;

            let output_value = outputs
                .values()
                .next()
                .ok_or_else(|| AppError::Inference("Model produced no outputs".to_string()))?;

            let (_, data) = output_value
                .try_extract_tensor::<f32>()
                .map_err(|e| AppError::Inference(format!("Failed to extract output tensor: {}", e)))?;

            Ok(data.to_vec())
        }
    }
}
