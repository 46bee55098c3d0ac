use async_trait::async_trait;

/// The numeric backend that has to be initialised before any model work.
#[async_trait]
pub trait NumericRuntime: Send + Sync {
    /// Resolves once the backend can run inference. Safe to call repeatedly.
    async fn ready(&self);
}

/// A runtime with nothing to set up.
pub struct ImmediateRuntime;

#[async_trait]
impl NumericRuntime for ImmediateRuntime {
    async fn ready(&self) {}
}

#[cfg(feature = "onnx")]
pub use onnx::OrtRuntime;

#[cfg(feature = "onnx")]
mod onnx {
    use super::NumericRuntime;
    use async_trait::async_trait;
    use tokio::sync::OnceCell;
    use tracing::{info, warn};

    /// Commits the process-wide ONNX Runtime environment exactly once.
    pub struct OrtRuntime {
        name: String,
        committed: OnceCell<()>,
    }

    impl OrtRuntime {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                committed: OnceCell::new(),
            }
        }
    }

    #[async_trait]
    impl NumericRuntime for OrtRuntime {
        async fn ready(&self) {
            self.committed
                .get_or_init(|| async {
                    let name = self.name.clone();
                    let committed = tokio::task::spawn_blocking(move || {
                        let _ = ort::init().with_name(name).commit();
                    })
                    .await;
                    match committed {
                        Ok(()) => info!("ONNX Runtime environment ready"),
                        Err(e) => warn!("ONNX Runtime init task failed: {}", e),
                    }
                })
                .await;
        }
    }
}
