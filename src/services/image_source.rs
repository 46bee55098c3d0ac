use crate::models::image_types::PickResult;
use async_trait::async_trait;

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico",
];

/// A user-driven file chooser.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn pick_image(&self) -> PickResult;
}

#[cfg(feature = "desktop")]
pub use dialog::DialogImageSource;

#[cfg(feature = "desktop")]
mod dialog {
    use super::{ImageSource, IMAGE_EXTENSIONS};
    use crate::models::image_types::PickResult;
    use async_trait::async_trait;
    use tauri::AppHandle;
    use tauri_plugin_dialog::DialogExt;
    use tracing::warn;

    pub struct DialogImageSource {
        app: AppHandle,
    }

    impl DialogImageSource {
        pub fn new(app: AppHandle) -> Self {
            Self { app }
        }
    }

    #[async_trait]
    impl ImageSource for DialogImageSource {
        async fn pick_image(&self) -> PickResult {
            let (tx, rx) = tokio::sync::oneshot::channel();
            self.app
                .dialog()
                .file()
                .add_filter("Images", IMAGE_EXTENSIONS)
                .pick_file(move |picked| {
                    let _ = tx.send(picked);
                });

            match rx.await {
                Ok(Some(picked)) => match picked.into_path() {
                    Ok(path) => PickResult::Picked(path.to_string_lossy().to_string()),
                    Err(e) => {
                        warn!("Picked file has no local path: {}", e);
                        PickResult::Cancelled
                    }
                },
                _ => PickResult::Cancelled,
            }
        }
    }
}
