use serde::Serialize;
use std::fmt;

/// The image the user picked, tagged with its position in the selection order.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub uri: String,
    pub generation: u64,
}

/// Outcome of asking the user for an image.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "uri", rename_all = "snake_case")]
pub enum PickResult {
    Cancelled,
    Picked(String),
}

/// Decoded pixels, row-major with interleaved channels.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn from_rgb(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, 3, img.into_raw())
    }

    /// An all-black RGB buffer.
    pub fn zeroed(width: u32, height: u32) -> Self {
        Self::new(width, height, 3, vec![0; width as usize * height as usize * 3])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

// Pixel data is elided; a full-size photo would flood the logs.
impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.data.len())
            .finish()
    }
}
