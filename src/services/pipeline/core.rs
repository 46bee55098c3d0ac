use crate::error::AppError;
use crate::models::classify_types::PredictionSet;
use crate::models::image_types::{ImageBuffer, SelectedImage};
use crate::models::pipeline_types::{PermissionState, PipelineState, SessionState};
use tracing::debug;

#[derive(Debug)]
pub enum Event {
    Start,
    RuntimeReady,
    ModelLoadStarted,
    ModelLoadDone(Result<(), AppError>),
    PermissionResolved(PermissionState),
    ImageSelected {
        uri: String,
    },
    DecodeDone {
        generation: u64,
        result: Result<ImageBuffer, AppError>,
    },
    ClassifyDone {
        generation: u64,
        result: Result<PredictionSet, AppError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AwaitRuntime,
    LoadModel,
    RequestPermission,
    DecodeImage {
        image: SelectedImage,
    },
    ClassifyImage {
        image: SelectedImage,
        buffer: ImageBuffer,
    },
}

pub fn init() -> (PipelineState, Vec<Effect>) {
    (PipelineState::Booting { started: false }, vec![])
}

pub fn transition(state: PipelineState, event: Event) -> (PipelineState, Vec<Effect>) {
    match (state, event) {
        // Startup, traversed once
        (PipelineState::Booting { started: false }, Event::Start) => (
            PipelineState::Booting { started: true },
            vec![Effect::AwaitRuntime],
        ),
        (PipelineState::Booting { started: true }, Event::RuntimeReady) => {
            (PipelineState::RuntimeReady, vec![Effect::LoadModel])
        }
        (PipelineState::RuntimeReady, Event::ModelLoadStarted) => {
            (PipelineState::ModelLoading, vec![])
        }
        (PipelineState::ModelLoading, Event::ModelLoadDone(Ok(()))) => (
            PipelineState::ModelReady {
                permission: PermissionState::Unknown,
                selections: 0,
                session: SessionState::Idle,
            },
            vec![Effect::RequestPermission],
        ),
        (PipelineState::ModelLoading, Event::ModelLoadDone(Err(error))) => {
            (PipelineState::ModelFailed { error }, vec![])
        }

        // Permission is orthogonal to the session
        (
            PipelineState::ModelReady {
                selections,
                session,
                ..
            },
            Event::PermissionResolved(permission),
        ) => (
            PipelineState::ModelReady {
                permission,
                selections,
                session,
            },
            vec![],
        ),

        // A new selection always wins, whatever the session was doing
        (
            PipelineState::ModelReady {
                permission,
                selections,
                ..
            },
            Event::ImageSelected { uri },
        ) => {
            let image = SelectedImage {
                uri,
                generation: selections + 1,
            };
            (
                PipelineState::ModelReady {
                    permission,
                    selections: image.generation,
                    session: SessionState::ImageSelected {
                        image: image.clone(),
                    },
                },
                vec![Effect::DecodeImage { image }],
            )
        }

        (
            PipelineState::ModelReady {
                permission,
                selections,
                session: SessionState::ImageSelected { image },
            },
            Event::DecodeDone { generation, result },
        ) if generation == image.generation => match result {
            Ok(buffer) => (
                PipelineState::ModelReady {
                    permission,
                    selections,
                    session: SessionState::Classifying {
                        image: image.clone(),
                    },
                },
                vec![Effect::ClassifyImage { image, buffer }],
            ),
            Err(error) => (
                PipelineState::ModelReady {
                    permission,
                    selections,
                    session: SessionState::Failed { image, error },
                },
                vec![],
            ),
        },

        (
            PipelineState::ModelReady {
                permission,
                selections,
                session: SessionState::Classifying { image },
            },
            Event::ClassifyDone { generation, result },
        ) if generation == image.generation => {
            let session = match result {
                Ok(predictions) => SessionState::Classified { image, predictions },
                Err(error) => SessionState::Failed { image, error },
            };
            (
                PipelineState::ModelReady {
                    permission,
                    selections,
                    session,
                },
                vec![],
            )
        }

        (state, Event::DecodeDone { generation, .. } | Event::ClassifyDone { generation, .. }) => {
            debug!(generation, current = ?state.current_image().map(|i| i.generation), "discarding stale result");
            (state, vec![])
        }

        (state, event) => {
            debug!(?event, "event ignored in current state");
            (state, vec![])
        }
    }
}
