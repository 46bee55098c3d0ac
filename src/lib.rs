#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::AppError;
pub use models::classify_types::{Prediction, PredictionSet};
pub use models::image_types::{ImageBuffer, PickResult, SelectedImage};
pub use models::pipeline_types::{PermissionState, PipelineState, RuntimeStatus, SessionState};
pub use services::pipeline::controller::{Collaborators, PipelineController};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use crate::config::ModelConfig;
    use tauri::{Emitter, Manager};
    use tracing::{error, info};

    logging::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            std::fs::create_dir_all(&app_data_dir)?;

            let config = ModelConfig::from_env(app_data_dir.join("models"));
            info!("Model directory: {}", config.model_dir.display());

            // The event loop has to live on Tauri's tokio runtime.
            let controller = tauri::async_runtime::block_on(async move {
                PipelineController::spawn(Collaborators::onnx(config))
            });
            app.manage(controller.clone());

            let app_handle = app.handle().clone();
            let mut states = controller.subscribe();
            tauri::async_runtime::spawn(async move {
                while states.changed().await.is_ok() {
                    let state = states.borrow_and_update().clone();
                    if let Err(e) = app_handle.emit("pipeline-state", &state) {
                        error!("Failed to emit pipeline state: {}", e);
                    }
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::pipeline::start_pipeline,
            commands::pipeline::select_image,
            commands::pipeline::pick_image,
            commands::pipeline::get_pipeline_state,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
