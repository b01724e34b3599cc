use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Longest side, in pixels, an image may keep before it is scaled down.
    pub max_dimension: u32,
    /// Extra contrast in percent after the stretch; 0 disables it.
    pub contrast: f32,
    pub sharpen: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { max_dimension: 2000, contrast: 20.0, sharpen: true }
    }
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …) and return normalized PNG bytes.
pub fn prepare_for_ocr(data: &[u8], config: &PreprocessConfig) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img, config))
}

/// Downscale, grayscale, contrast stretch, then the optional enhancements.
fn normalize(img: DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let img = if img.width() > config.max_dimension || img.height() > config.max_dimension {
        img.resize(config.max_dimension, config.max_dimension, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let mut img = stretch_contrast(img.to_luma8());
    if config.contrast != 0.0 {
        img = img.adjust_contrast(config.contrast);
    }
    if config.sharpen {
        img = img.unsharpen(1.0, 4);
    }
    img
}

/// Map the darkest pixel to 0 and the brightest to 255.
fn stretch_contrast(gray: GrayImage) -> DynamicImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = (max_px - min_px) as u32;
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    });
    DynamicImage::ImageLuma8(stretched)
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
