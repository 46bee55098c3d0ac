mod common;

use common::*;
use photo_labeler_lib::{
    AppError, PermissionState, PickResult, PipelineController, PipelineState, RuntimeStatus,
    SessionState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

async fn wait_for(
    controller: &PipelineController,
    predicate: impl FnMut(&PipelineState) -> bool,
) -> PipelineState {
    timeout(WAIT, controller.wait_for(predicate))
        .await
        .expect("timed out waiting for pipeline state")
        .expect("pipeline stopped")
}

fn top_label(state: &PipelineState) -> Option<String> {
    state
        .predictions()
        .and_then(|p| p.top())
        .map(|p| p.label.clone())
}

fn is_classified(state: &PipelineState) -> bool {
    matches!(state.session(), Some(SessionState::Classified { .. }))
}

#[tokio::test]
async fn test_start_to_classified() {
    init_tracing();
    let files = Arc::new(MemoryFiles::default().with("red.png", solid_png([250, 10, 10])));
    let controller = PipelineController::spawn(collaborators(files));

    assert_eq!(controller.state().runtime_status(), RuntimeStatus::NotReady);
    controller.start();

    let state = wait_for(&controller, |s| s.permission() == PermissionState::Granted).await;
    assert_eq!(state.session(), Some(&SessionState::Idle));
    assert_eq!(state.runtime_status(), RuntimeStatus::Ready);

    controller.user_selected_image("red.png");
    let state = wait_for(&controller, is_classified).await;

    let predictions = state.predictions().unwrap();
    assert!(predictions.len() <= 3);
    assert!(predictions
        .predictions()
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    assert_eq!(top_label(&state).as_deref(), Some("red"));
    assert_eq!(state.current_image().map(|i| i.uri.as_str()), Some("red.png"));
}

#[tokio::test]
async fn test_denied_permission_still_classifies() {
    init_tracing();
    let files = Arc::new(MemoryFiles::default().with("blue.png", solid_png([5, 5, 250])));
    let mut collaborators = collaborators(files);
    collaborators.permission_gate = denying_gate();
    let controller = PipelineController::spawn(collaborators);
    controller.start();

    let state = wait_for(&controller, |s| s.permission() == PermissionState::Denied).await;
    assert!(state.is_model_ready());
    assert_eq!(state.permission().notice(), Some(AppError::PermissionDenied));

    controller.user_selected_image("blue.png");
    let state = wait_for(&controller, is_classified).await;
    assert_eq!(top_label(&state).as_deref(), Some("blue"));
}

#[tokio::test]
async fn test_corrupt_file_fails_then_recovers() {
    init_tracing();
    let files = Arc::new(
        MemoryFiles::default()
            .with("notes.txt", b"definitely not pixels".to_vec())
            .with("green.png", solid_png([10, 250, 10])),
    );
    let controller = PipelineController::spawn(collaborators(files));
    controller.start();
    wait_for(&controller, |s| s.is_model_ready()).await;

    controller.user_selected_image("notes.txt");
    let state = wait_for(&controller, |s| s.error().is_some()).await;
    assert!(matches!(state.error(), Some(AppError::Decode(_))));

    controller.user_selected_image("missing.png");
    let state = wait_for(&controller, |s| {
        s.current_image().map(|i| i.generation) == Some(2) && s.error().is_some()
    })
    .await;
    assert!(matches!(state.error(), Some(AppError::Decode(_))));

    controller.user_selected_image("green.png");
    let state = wait_for(&controller, is_classified).await;
    assert_eq!(top_label(&state).as_deref(), Some("green"));
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_newer_selection_supersedes_slow_one() {
    init_tracing();
    let files = Arc::new(
        MemoryFiles::default()
            .with("a.png", solid_png([250, 0, 0]))
            .with("b.png", solid_png([0, 0, 250]))
            .gated("a.png"),
    );
    let controller = PipelineController::spawn(collaborators(files.clone()));
    controller.start();
    wait_for(&controller, |s| s.is_model_ready()).await;

    controller.user_selected_image("a.png");
    wait_for(&controller, |s| s.current_image().map(|i| i.generation) == Some(1)).await;

    controller.user_selected_image("b.png");
    let state = wait_for(&controller, is_classified).await;
    assert_eq!(state.current_image().map(|i| i.uri.as_str()), Some("b.png"));
    assert_eq!(top_label(&state).as_deref(), Some("blue"));

    // Let A finish long after B.
    files.release("a.png");
    tokio::time::sleep(Duration::from_millis(300)).await;

    let state = controller.state();
    assert_eq!(state.current_image().map(|i| i.uri.as_str()), Some("b.png"));
    assert_eq!(top_label(&state).as_deref(), Some("blue"));
}

#[tokio::test]
async fn test_model_load_failure_blocks_classification() {
    init_tracing();
    let files = Arc::new(MemoryFiles::default().with("red.png", solid_png([250, 0, 0])));
    let mut collaborators = collaborators(files);
    collaborators.model_loader = Arc::new(BrokenLoader);
    let controller = PipelineController::spawn(collaborators);
    controller.start();

    let state = wait_for(&controller, |s| matches!(s, PipelineState::ModelFailed { .. })).await;
    assert!(matches!(state.error(), Some(AppError::ModelLoad(_))));

    controller.user_selected_image("red.png");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.state(), state);
}

#[tokio::test]
async fn test_pick_image_cancel_is_noop() {
    init_tracing();
    let files = Arc::new(MemoryFiles::default().with("red.png", solid_png([250, 0, 0])));
    let controller = PipelineController::spawn(collaborators(files));
    controller.start();
    let ready = wait_for(&controller, |s| s.permission() == PermissionState::Granted).await;

    let picked = controller.pick_image(&ScriptedSource(PickResult::Cancelled)).await;
    assert_eq!(picked, PickResult::Cancelled);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.state(), ready);

    controller
        .pick_image(&ScriptedSource(PickResult::Picked("red.png".into())))
        .await;
    let state = wait_for(&controller, is_classified).await;
    assert_eq!(top_label(&state).as_deref(), Some("red"));
}
