use image::{DynamicImage, ImageError, ImageReader};
use std::path::Path;

use crate::error::{PlateError, Result};

/// Load and decode an image file
pub fn load_path<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let origin = path.display().to_string();

    let img = ImageReader::open(path)
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(ImageError::IoError))
        .and_then(|reader| reader.decode())
        .map_err(|source| PlateError::ImageLoad { origin, source })?;

    ensure_dimensions(&img)?;
    Ok(img)
}

/// Decode an in-memory encoded image (JPEG, PNG, ...)
pub fn load_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes).map_err(|source| PlateError::ImageLoad {
        origin: "<bytes>".to_string(),
        source,
    })?;

    ensure_dimensions(&img)?;
    Ok(img)
}

/// Reject images with a zero dimension
pub fn ensure_dimensions(img: &DynamicImage) -> Result<()> {
    if img.width() == 0 || img.height() == 0 {
        return Err(PlateError::InvalidImage {
            width: img.width(),
            height: img.height(),
        });
    }
    Ok(())
}
