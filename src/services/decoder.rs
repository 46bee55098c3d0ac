use crate::error::AppError;
use crate::models::image_types::ImageBuffer;
use crate::services::file_access::FileAccess;
use base64::Engine;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Turns a picked file into RGB pixels.
#[derive(Clone)]
pub struct ImageDecoder {
    files: Arc<dyn FileAccess>,
}

impl ImageDecoder {
    pub fn new(files: Arc<dyn FileAccess>) -> Self {
        Self { files }
    }

    pub async fn decode(&self, uri: &str) -> Result<ImageBuffer, AppError> {
        let encoded = self.files.read_as_base64(uri).await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Decode(format!("File contents of {} are not base64: {}", uri, e)))?;

        let buffer = tokio::task::spawn_blocking(move || decode_bytes(&bytes))
            .await
            .map_err(|e| AppError::Decode(format!("Decode task failed: {}", e)))??;

        debug!(uri, width = buffer.width(), height = buffer.height(), "decoded image");
        Ok(buffer)
    }
}

/// Container detection is by magic bytes, not by file extension.
pub fn decode_bytes(bytes: &[u8]) -> Result<ImageBuffer, AppError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| AppError::Decode(format!("Unsupported or corrupt image: {}", e)))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(AppError::Decode(format!(
            "Degenerate image dimensions {}x{}",
            img.width(),
            img.height()
        )));
    }

    let img = apply_orientation(img, read_orientation(bytes));
    Ok(ImageBuffer::from_rgb(img.into_rgb8()))
}

/// EXIF orientation tag, 1 when absent or unreadable.
fn read_orientation(bytes: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    }
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}
