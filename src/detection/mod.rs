//! Image stages of the plate pipeline: loading, edge-map preprocessing,
//! contour-based candidate detection and per-region text recognition.

pub mod candidates;
pub mod contours;
pub mod edges;
pub mod ocr;
pub mod preprocessing;
pub mod source;
