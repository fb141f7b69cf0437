use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::Path;

use super::perceptual::Frame;
use crate::common::errors::LoadError;

/// Known image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp",
];

/// Check if a file is an image based on extension
pub fn is_image(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

/// Case-insensitive extension match
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|e| e.as_ref() == ext)
        })
        .unwrap_or(false)
}

/// A decoded image reduced to what the hasher needs
#[derive(Debug, Clone)]
pub struct LoadedFrame {
    pub frame: Frame,
    /// (width, height) after orientation correction
    pub resolution: (u32, u32),
    /// Hex SHA-256 of the raw file bytes
    pub digest: String,
}

/// Read, decode, orient and shrink one image file
pub fn load_frame(path: &Path, grid: u32) -> Result<LoadedFrame, LoadError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    let digest = format!("{:x}", Sha256::digest(&bytes));

    let img = decode_oriented(&bytes)?;
    let resolution = img.dimensions();
    if resolution.0 == 0 || resolution.1 == 0 {
        return Err(LoadError::Decode("image has no pixels".to_string()));
    }

    Ok(LoadedFrame {
        frame: frame_from_image(&img, grid),
        resolution,
        digest,
    })
}

/// Decode image bytes and apply their EXIF orientation, so a photo stored
/// sideways with a rotation tag comes out upright.
pub fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage, LoadError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Grayscale `grid`×`grid` samples of an already-oriented image
pub fn frame_from_image(img: &DynamicImage, grid: u32) -> Frame {
    let gray = img.to_luma8();
    let small = imageops::resize(&gray, grid, grid, FilterType::Triangle);
    let pixels: Vec<f64> = small.pixels().map(|p| p.0[0] as f64).collect();
    Frame::square(grid as usize, pixels)
}
