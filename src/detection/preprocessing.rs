use image::{DynamicImage, GrayImage};
use imageproc::filter::separable_filter_equal;
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::detection::edges::canny;
use crate::detection::source::ensure_dimensions;
use crate::error::Result;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Normalized 1-D Gaussian kernel of `size` taps
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Apply a fixed-size separable Gaussian blur
pub fn apply_blur(img: &GrayImage, kernel_size: u32, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size, sigma);
    separable_filter_equal(img, kernel.as_slice())
}

/// Canny with 3x3 Sobel gradients and L1 magnitude. The input must already be smoothed.
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Turns a source image into a binary edge map (0 or 255)
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    pub config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn preprocess(&self, img: &DynamicImage) -> Result<GrayImage> {
        ensure_dimensions(img)?;

        let sigma = self.config.effective_sigma();
        debug!(
            width = img.width(),
            height = img.height(),
            kernel = self.config.kernel_size,
            sigma,
            "Preprocessing image"
        );

        let gray = to_grayscale(img);
        let blurred = apply_blur(&gray, self.config.kernel_size, sigma);
        let edges = detect_edges(&blurred, self.config.low_threshold, self.config.high_threshold);

        debug!(
            edge_pixels = edges.pixels().filter(|p| p[0] > 0).count(),
            "Edge map ready"
        );
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlateError;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(5, 1.1);
        assert_eq!(k.len(), 5);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[4]).abs() < 1e-7);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn blur_keeps_flat_image_flat() {
        let img = GrayImage::from_pixel(20, 10, Luma([128]));
        let blurred = apply_blur(&img, 5, 1.1);
        assert!(blurred.pixels().all(|p| (p[0] as i32 - 128).abs() <= 1));
    }

    #[test]
    fn blank_white_image_has_no_edges() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([255, 255, 255])));
        let edges = Preprocessor::default().preprocess(&img).unwrap();
        assert_eq!(edges.dimensions(), (120, 80));
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn dark_rectangle_produces_binary_edges() {
        let mut rgb = RgbImage::from_pixel(160, 100, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut rgb, Rect::at(40, 25).of_size(80, 50), Rgb([0, 0, 0]));
        let edges = Preprocessor::default()
            .preprocess(&DynamicImage::ImageRgb8(rgb))
            .unwrap();

        assert_eq!(edges.dimensions(), (160, 100));
        assert!(edges.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(edges.pixels().any(|p| p[0] == 255));
        // Interior of the rectangle is flat
        assert_eq!(edges.get_pixel(80, 50)[0], 0);
    }

    #[test]
    fn moderate_step_above_high_threshold_is_kept() {
        // Black to gray 100: after the 5x5 blur alone the peak L1 gradient is ~290
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(60, 40, |x, _| {
            Luma([if x < 30 { 0 } else { 100 }])
        }));

        let blurred = apply_blur(&to_grayscale(&img), 5, 1.1);
        let (_, _, mag) = crate::detection::edges::gradient_magnitude(&blurred);
        let peak = mag.iter().cloned().fold(0.0f32, f32::max);
        assert!(peak > 200.0, "peak gradient {}", peak);

        let edges = Preprocessor::default().preprocess(&img).unwrap();
        for y in 2..38 {
            let row: Vec<u32> = (0..60).filter(|&x| edges.get_pixel(x, y)[0] == 255).collect();
            assert_eq!(row.len(), 1, "row {}: {:?}", y, row);
            assert!((29..=30).contains(&row[0]));
        }
    }

    #[test]
    fn zero_dimension_input_is_rejected() {
        let img = DynamicImage::new_rgb8(0, 0);
        let err = Preprocessor::default().preprocess(&img).unwrap_err();
        assert!(matches!(err, PlateError::InvalidImage { .. }));
    }
}
