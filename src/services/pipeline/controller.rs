use crate::models::image_types::PickResult;
use crate::models::pipeline_types::PipelineState;
use crate::services::classifier::session::{ClassifierSession, ModelLoader};
use crate::services::decoder::ImageDecoder;
use crate::services::file_access::FileAccess;
use crate::services::image_source::ImageSource;
use crate::services::permission::PermissionGate;
use crate::services::pipeline::core::{init, transition, Effect, Event};
use crate::services::pipeline::run_effect::RunEffect;
use crate::services::runtime::NumericRuntime;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// The host capabilities the pipeline depends on.
pub struct Collaborators {
    pub runtime: Arc<dyn NumericRuntime>,
    pub permission_gate: Arc<dyn PermissionGate>,
    pub file_access: Arc<dyn FileAccess>,
    pub model_loader: Arc<dyn ModelLoader>,
}

#[cfg(feature = "onnx")]
impl Collaborators {
    /// ONNX Runtime classifier reading local files, as used by the desktop app.
    pub fn onnx(config: crate::config::ModelConfig) -> Self {
        use crate::services::classifier::model_manager::ModelManager;
        use crate::services::file_access::LocalFileAccess;
        use crate::services::permission::platform_gate;
        use crate::services::runtime::OrtRuntime;

        Self {
            runtime: Arc::new(OrtRuntime::new("photo-labeler")),
            permission_gate: platform_gate(),
            file_access: Arc::new(LocalFileAccess),
            model_loader: Arc::new(ModelManager::new(config)),
        }
    }
}

/// Command and observation handle for the pipeline.
///
/// The event loop task is the only writer of [`PipelineState`]. It stops once
/// every clone of the controller has been dropped.
#[derive(Clone)]
pub struct PipelineController {
    events: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<PipelineState>,
}

impl PipelineController {
    /// Spawns the event loop on the current tokio runtime.
    pub fn spawn(collaborators: Collaborators) -> Self {
        let (events, event_receiver) = mpsc::unbounded_channel();
        let (initial, effects) = init();
        let (state_sender, state) = watch::channel(initial.clone());

        let run_effect = RunEffect::new(
            collaborators.runtime,
            collaborators.permission_gate,
            ImageDecoder::new(collaborators.file_access),
            ClassifierSession::new(collaborators.model_loader),
            events.downgrade(),
        );

        tokio::spawn(run_loop(initial, effects, event_receiver, state_sender, run_effect));

        Self { events, state }
    }

    /// Kicks off runtime init and model load. Later calls do nothing.
    pub fn start(&self) {
        self.send(Event::Start);
    }

    pub fn user_selected_image(&self, uri: impl Into<String>) {
        self.send(Event::ImageSelected { uri: uri.into() });
    }

    /// Asks `source` for an image and selects it. Cancelling leaves the state as it was.
    pub async fn pick_image(&self, source: &dyn ImageSource) -> PickResult {
        let picked = source.pick_image().await;
        match &picked {
            PickResult::Picked(uri) => self.user_selected_image(uri.clone()),
            PickResult::Cancelled => debug!("Image pick cancelled"),
        }
        picked
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    /// Waits until the published state satisfies `predicate`.
    /// Returns `None` if the event loop has stopped.
    pub async fn wait_for(&self, predicate: impl FnMut(&PipelineState) -> bool) -> Option<PipelineState> {
        let mut state = self.state.clone();
        let matched = state.wait_for(predicate).await.ok()?;
        Some(matched.clone())
    }

    fn send(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

async fn run_loop(
    mut state: PipelineState,
    effects: Vec<Effect>,
    mut event_receiver: mpsc::UnboundedReceiver<Event>,
    state_sender: watch::Sender<PipelineState>,
    run_effect: RunEffect,
) {
    spawn_effects(&run_effect, effects);

    while let Some(event) = event_receiver.recv().await {
        debug!(?event, "Handling event");
        let (new_state, effects) = transition(state, event);
        debug!(state = ?new_state, ?effects, "Transitioned");

        state_sender.send_replace(new_state.clone());
        state = new_state;

        spawn_effects(&run_effect, effects);
    }

    info!("Pipeline controller stopped");
}

fn spawn_effects(run_effect: &RunEffect, effects: Vec<Effect>) {
    for effect in effects {
        let run_effect = run_effect.clone();
        tokio::spawn(async move { run_effect.run_effect(effect).await });
    }
}
