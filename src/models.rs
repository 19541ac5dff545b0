use image::{DynamicImage, GenericImageView};
use serde::Serialize;

/// Axis-aligned rectangle in the coordinate space of a source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Build a region from inclusive corner coordinates
    pub fn from_corners(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the region is non-empty and lies entirely inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    /// Copy the region out of `img`. Returns None if it does not fit.
    pub fn crop(&self, img: &DynamicImage) -> Option<DynamicImage> {
        let (w, h) = img.dimensions();
        if !self.fits_within(w, h) {
            return None;
        }
        Some(img.crop_imm(self.x, self.y, self.width, self.height))
    }
}

/// Text read from one candidate region. Empty text means no confident read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognitionResult {
    pub region: Region,
    pub text: String,
}

impl RecognitionResult {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Everything recognized in one image, in candidate discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineOutcome {
    pub results: Vec<RecognitionResult>,
    /// Regions whose recognition failed or timed out (their text is empty)
    pub failed: usize,
}

impl PipelineOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Non-empty transcriptions only, in order
    pub fn texts(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| r.text.as_str())
            .collect()
    }

    pub fn regions(&self) -> Vec<Region> {
        self.results.iter().map(|r| r.region).collect()
    }
}
