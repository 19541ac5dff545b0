use image::GrayImage;
use tracing::debug;

use crate::config::DetectorConfig;
use crate::detection::contours::trace_contours;
use crate::models::Region;

/// Picks plate-shaped bounding boxes out of an edge map
#[derive(Debug, Clone, Default)]
pub struct CandidateDetector {
    pub config: DetectorConfig,
}

impl CandidateDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Wider than tall (by `min_aspect_ratio`) and large enough. Both comparisons are strict.
    pub fn passes(&self, region: &Region) -> bool {
        !region.is_empty()
            && region.aspect_ratio() > self.config.min_aspect_ratio
            && region.area() > self.config.min_area
    }

    /// Candidate regions in contour discovery order.
    ///
    /// Nested and overlapping contours are all reported, so one physical plate
    /// can produce several regions (e.g. the outer and hole border of its frame).
    pub fn detect(&self, edges: &GrayImage) -> Vec<Region> {
        let contours = trace_contours(edges);
        let total = contours.len();

        let candidates: Vec<Region> = contours
            .iter()
            .filter_map(|c| c.bounding_rect())
            .filter(|r| self.passes(r))
            .collect();

        debug!(contours = total, candidates = candidates.len(), "Candidate detection done");
        candidates
    }
}
