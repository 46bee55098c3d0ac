use crate::error::AppError;
use crate::services::classifier::session::{self, ClassifierSession};
use crate::services::decoder::ImageDecoder;
use crate::services::permission::PermissionGate;
use crate::services::pipeline::core::{Effect, Event};
use crate::services::runtime::NumericRuntime;
use std::sync::Arc;
use tokio::sync::mpsc::WeakUnboundedSender;
use tracing::{debug, info, warn};

/// Executes effects against the collaborators and reports back as events.
#[derive(Clone)]
pub struct RunEffect {
    runtime: Arc<dyn NumericRuntime>,
    permission_gate: Arc<dyn PermissionGate>,
    decoder: ImageDecoder,
    classifier: ClassifierSession,
    event_sender: WeakUnboundedSender<Event>,
}

impl RunEffect {
    pub fn new(
        runtime: Arc<dyn NumericRuntime>,
        permission_gate: Arc<dyn PermissionGate>,
        decoder: ImageDecoder,
        classifier: ClassifierSession,
        event_sender: WeakUnboundedSender<Event>,
    ) -> Self {
        Self {
            runtime,
            permission_gate,
            decoder,
            classifier,
            event_sender,
        }
    }

    pub async fn run_effect(&self, effect: Effect) {
        debug!(?effect, "Running effect");

        match effect {
            Effect::AwaitRuntime => {
                self.runtime.ready().await;
                self.send(Event::RuntimeReady);
            }
            Effect::LoadModel => {
                self.send(Event::ModelLoadStarted);
                let loaded = self.classifier.load().await.map(|_| ());
                if let Err(e) = &loaded {
                    warn!("Model load failed: {}", e);
                }
                self.send(Event::ModelLoadDone(loaded));
            }
            Effect::RequestPermission => {
                let permission = self.permission_gate.request_media_access().await;
                info!(?permission, "Media access resolved");
                self.send(Event::PermissionResolved(permission));
            }
            Effect::DecodeImage { image } => {
                let result = self.decoder.decode(&image.uri).await;
                if let Err(e) = &result {
                    warn!("Failed to decode {}: {}", image.uri, e);
                }
                self.send(Event::DecodeDone {
                    generation: image.generation,
                    result,
                });
            }
            Effect::ClassifyImage { image, buffer } => {
                let result = match self.classifier.handle() {
                    Some(handle) => session::classify(&handle, buffer).await,
                    None => Err(AppError::Inference("Model is not loaded".to_string())),
                };
                if let Err(e) = &result {
                    warn!("Failed to classify {}: {}", image.uri, e);
                }
                self.send(Event::ClassifyDone {
                    generation: image.generation,
                    result,
                });
            }
        }
    }

    // The loop is gone once every controller handle is dropped; late results go nowhere.
    fn send(&self, event: Event) {
        if let Some(sender) = self.event_sender.upgrade() {
            let _ = sender.send(event);
        }
    }
}
