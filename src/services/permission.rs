use crate::models::pipeline_types::PermissionState;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request_media_access(&self) -> PermissionState;
}

/// The platform's consent dialog. `true` means the user granted access.
#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn ask(&self) -> bool;
}

/// Gate for platforms where any readable file is fair game.
pub struct NotRequiredGate;

#[async_trait]
impl PermissionGate for NotRequiredGate {
    async fn request_media_access(&self) -> PermissionState {
        PermissionState::Granted
    }
}

/// Shows the consent prompt at most once per session and replays the answer.
pub struct PromptingGate {
    prompt: Arc<dyn ConsentPrompt>,
    answer: OnceCell<PermissionState>,
}

impl PromptingGate {
    pub fn new(prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self {
            prompt,
            answer: OnceCell::new(),
        }
    }
}

#[async_trait]
impl PermissionGate for PromptingGate {
    async fn request_media_access(&self) -> PermissionState {
        *self
            .answer
            .get_or_init(|| async {
                if self.prompt.ask().await {
                    info!("Media library access granted");
                    PermissionState::Granted
                } else {
                    warn!("Sorry, we need media library permissions to make this work!");
                    PermissionState::Denied
                }
            })
            .await
    }
}

/// Desktop file pickers are not gated by a media-library permission.
pub fn platform_gate() -> Arc<dyn PermissionGate> {
    Arc::new(NotRequiredGate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrompt {
        grant: bool,
        asked: AtomicUsize,
    }

    #[async_trait]
    impl ConsentPrompt for CountingPrompt {
        async fn ask(&self) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.grant
        }
    }

    #[tokio::test]
    async fn not_required_grants_without_prompt() {
        assert_eq!(NotRequiredGate.request_media_access().await, PermissionState::Granted);
    }

    #[tokio::test]
    async fn prompts_once_per_session() {
        let prompt = Arc::new(CountingPrompt {
            grant: false,
            asked: AtomicUsize::new(0),
        });
        let gate = PromptingGate::new(prompt.clone());

        let (a, b) = tokio::join!(gate.request_media_access(), gate.request_media_access());
        let c = gate.request_media_access().await;

        assert_eq!(a, PermissionState::Denied);
        assert_eq!(b, PermissionState::Denied);
        assert_eq!(c, PermissionState::Denied);
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn granted_prompt_reports_granted() {
        let prompt = Arc::new(CountingPrompt {
            grant: true,
            asked: AtomicUsize::new(0),
        });
        let gate = PromptingGate::new(prompt);
        assert_eq!(gate.request_media_access().await, PermissionState::Granted);
    }
}
