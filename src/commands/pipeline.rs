use crate::error::AppError;
use crate::models::image_types::PickResult;
use crate::models::pipeline_types::PipelineState;
use crate::services::image_source::DialogImageSource;
use crate::services::pipeline::controller::PipelineController;
use tauri::{AppHandle, State};

#[tauri::command]
pub fn start_pipeline(controller: State<'_, PipelineController>) -> Result<(), AppError> {
    controller.start();
    Ok(())
}

#[tauri::command]
pub fn select_image(controller: State<'_, PipelineController>, uri: String) -> Result<(), AppError> {
    controller.user_selected_image(uri);
    Ok(())
}

#[tauri::command]
pub async fn pick_image(
    app: AppHandle,
    controller: State<'_, PipelineController>,
) -> Result<PickResult, AppError> {
    let source = DialogImageSource::new(app);
    Ok(controller.pick_image(&source).await)
}

#[tauri::command]
pub fn get_pipeline_state(controller: State<'_, PipelineController>) -> Result<PipelineState, AppError> {
    Ok(controller.state())
}
