use crate::error::AppError;
use crate::models::classify_types::PredictionSet;
use crate::models::image_types::SelectedImage;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    NotReady,
    Ready,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    /// A user-facing notice when access was refused.
    pub fn notice(&self) -> Option<AppError> {
        match self {
            PermissionState::Denied => Some(AppError::PermissionDenied),
            _ => None,
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PipelineState {
    Booting {
        started: bool,
    },
    RuntimeReady,
    ModelLoading,
    ModelFailed {
        error: AppError,
    },
    ModelReady {
        permission: PermissionState,
        selections: u64,
        session: SessionState,
    },
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    ImageSelected {
        image: SelectedImage,
    },
    Classifying {
        image: SelectedImage,
    },
    Classified {
        image: SelectedImage,
        predictions: PredictionSet,
    },
    Failed {
        image: SelectedImage,
        error: AppError,
    },
}

impl SessionState {
    pub fn image(&self) -> Option<&SelectedImage> {
        match self {
            SessionState::Idle => None,
            SessionState::ImageSelected { image }
            | SessionState::Classifying { image }
            | SessionState::Classified { image, .. }
            | SessionState::Failed { image, .. } => Some(image),
        }
    }
}

impl PipelineState {
    pub fn runtime_status(&self) -> RuntimeStatus {
        match self {
            PipelineState::Booting { .. } => RuntimeStatus::NotReady,
            _ => RuntimeStatus::Ready,
        }
    }

    pub fn is_model_ready(&self) -> bool {
        matches!(self, PipelineState::ModelReady { .. })
    }

    pub fn permission(&self) -> PermissionState {
        match self {
            PipelineState::ModelReady { permission, .. } => *permission,
            _ => PermissionState::Unknown,
        }
    }

    pub fn session(&self) -> Option<&SessionState> {
        match self {
            PipelineState::ModelReady { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn current_image(&self) -> Option<&SelectedImage> {
        self.session().and_then(SessionState::image)
    }

    pub fn predictions(&self) -> Option<&PredictionSet> {
        match self.session() {
            Some(SessionState::Classified { predictions, .. }) => Some(predictions),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            PipelineState::ModelFailed { error } => Some(error),
            PipelineState::ModelReady {
                session: SessionState::Failed { error, .. },
                ..
            } => Some(error),
            _ => None,
        }
    }
}
