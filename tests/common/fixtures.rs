use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use platescan::{EngineFactory, PlateError, RecognitionEngine, Result};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Creates a white image with dark filled rectangles `(x, y, width, height)`
pub fn plate_image(width: u32, height: u32, plates: &[(i32, i32, u32, u32)]) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([255u8, 255, 255]));
    for &(x, y, w, h) in plates {
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Rgb([20u8, 20, 20]));
    }
    img
}

/// Saves an image to a temp file with the given format.
/// The file will be automatically cleaned up when dropped.
pub fn save_temp(img: &RgbImage, format: ImageFormat) -> NamedTempFile {
    let suffix = match format {
        ImageFormat::Jpeg => ".jpg",
        _ => ".png",
    };
    let file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), format)
        .expect("Failed to save test image");
    file
}

/// One clear 80x50 (4000px²) plate on a 200x120 background, with a
/// 1-pixel mid-gray anti-aliased border so its edge falls on a single pixel ring
pub fn single_plate_image() -> RgbImage {
    let mut img = plate_image(200, 120, &[]);
    draw_filled_rect_mut(&mut img, Rect::at(59, 34).of_size(82, 52), Rgb([137u8, 137, 137]));
    draw_filled_rect_mut(&mut img, Rect::at(60, 35).of_size(80, 50), Rgb([20u8, 20, 20]));
    img
}

/// Bounding box of the edge ring around `single_plate_image`'s plate
pub const SINGLE_PLATE_RING: platescan::Region = platescan::Region {
    x: 59,
    y: 34,
    width: 82,
    height: 52,
};

pub fn single_plate_file() -> NamedTempFile {
    save_temp(&single_plate_image(), ImageFormat::Png)
}

pub fn blank_file() -> NamedTempFile {
    save_temp(&plate_image(160, 100, &[]), ImageFormat::Png)
}

/// Engine that answers with the crop size, e.g. "80x50\n"
pub struct SizeEngine {
    /// Fail on crops wider than this
    pub fail_wider_than: Option<u32>,
    pub delay: Duration,
}

impl RecognitionEngine for SizeEngine {
    fn recognize(&mut self, encoded_png: &[u8]) -> Result<String> {
        let img = image::load_from_memory(encoded_png)
            .map_err(|e| PlateError::Recognition(e.to_string()))?;
        std::thread::sleep(self.delay);
        if let Some(limit) = self.fail_wider_than {
            if img.width() > limit {
                return Err(PlateError::Recognition("crop too wide".into()));
            }
        }
        Ok(format!("{}x{}\n", img.width(), img.height()))
    }
}

#[derive(Clone, Default)]
pub struct SizeEngineFactory {
    pub fail_wider_than: Option<u32>,
    pub delay: Duration,
}

impl EngineFactory for SizeEngineFactory {
    fn create(&self) -> Result<Box<dyn RecognitionEngine>> {
        Ok(Box::new(SizeEngine {
            fail_wider_than: self.fail_wider_than,
            delay: self.delay,
        }))
    }
}

pub fn size_text(region: &platescan::Region) -> String {
    format!("{}x{}", region.width, region.height)
}
