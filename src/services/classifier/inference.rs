use crate::error::AppError;
use crate::models::classify_types::{Prediction, PredictionSet};
use crate::models::image_types::ImageBuffer;
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

const CROP_PCT: f32 = 0.875;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Rejects buffers that do not describe a non-empty RGB image.
pub fn validate_shape(buffer: &ImageBuffer) -> Result<(), AppError> {
    if buffer.width() == 0 || buffer.height() == 0 {
        return Err(AppError::Inference(format!(
            "Input has a zero dimension ({}x{})",
            buffer.width(),
            buffer.height()
        )));
    }
    if buffer.channels() != 3 {
        return Err(AppError::Inference(format!(
            "Expected 3 channels, got {}",
            buffer.channels()
        )));
    }
    let expected = buffer.width() as usize * buffer.height() as usize * 3;
    if buffer.data().len() != expected {
        return Err(AppError::Inference(format!(
            "Pixel data has {} bytes, expected {} for {}x{}x3",
            buffer.data().len(),
            expected,
            buffer.width(),
            buffer.height()
        )));
    }
    Ok(())
}

pub fn preprocess_buffer(buffer: ImageBuffer, crop_size: u32) -> Result<Array4<f32>, AppError> {
    validate_shape(&buffer)?;
    let (w, h) = (buffer.width(), buffer.height());
    let rgb = RgbImage::from_raw(w, h, buffer.into_data())
        .ok_or_else(|| AppError::Inference("Pixel data does not fit its dimensions".to_string()))?;
    let img = DynamicImage::ImageRgb8(rgb);

    // Center crop of a shortest-edge resize to ceil(crop_size / crop_pct), taken in source pixels
    let (side, crop_x, crop_y) = center_crop_window(w, h, crop_size);
    let cropped = img
        .crop_imm(crop_x, crop_y, side, side)
        .resize_exact(crop_size, crop_size, image::imageops::FilterType::Triangle);
    let raw = cropped.to_rgb8().into_raw();

    // HWC u8 -> normalized CHW f32
    let hw = (crop_size * crop_size) as usize;
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Array4::from_shape_vec((1, 3, crop_size as usize, crop_size as usize), data)
        .map_err(|e| AppError::Inference(format!("Failed to create tensor: {}", e)))
}

/// Square center window `(side, x, y)` in source pixels.
fn center_crop_window(w: u32, h: u32, crop_size: u32) -> (u32, u32, u32) {
    let resize_size = (crop_size as f32 / CROP_PCT).ceil();
    let shortest = w.min(h);
    let side = ((shortest as f32 * crop_size as f32 / resize_size).round() as u32).clamp(1, shortest);
    (side, (w - side) / 2, (h - side) / 2)
}

/// Softmax over `logits`, then the `top_k` most confident labels.
///
/// Ties keep the model's output order. Non-finite values anywhere are an error
/// rather than a silently wrong ranking.
pub fn rank_predictions(
    logits: &[f32],
    labels: &[String],
    top_k: usize,
) -> Result<PredictionSet, AppError> {
    if logits.is_empty() {
        return Err(AppError::Inference("Model produced an empty output".to_string()));
    }
    if let Some(idx) = logits.iter().position(|x| !x.is_finite()) {
        return Err(AppError::Inference(format!(
            "Model output {} is not a finite number",
            idx
        )));
    }

    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    let probabilities: Vec<f32> = logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect();

    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(AppError::Inference("Softmax produced a non-finite probability".to_string()));
    }

    // sort_by is stable, so equal confidences stay in index order
    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));

    let predictions = indexed
        .into_iter()
        .take(top_k)
        .map(|(idx, confidence)| Prediction {
            label: labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx)),
            confidence,
        })
        .collect();

    Ok(PredictionSet::from_ranked(predictions))
}
