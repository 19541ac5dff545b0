use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::models::Region;

/// A traced border with its place in the contour tree
#[derive(Debug, Clone)]
pub struct TracedContour {
    pub points: Vec<Point<u32>>,
    pub is_hole: bool,
    /// Index of the enclosing contour, if any
    pub parent: Option<usize>,
}

impl TracedContour {
    pub fn bounding_rect(&self) -> Option<Region> {
        bounding_rect(&self.points)
    }
}

/// Trace every border (outer and hole) in a binary edge map, in discovery order.
/// Non-zero pixels are foreground.
pub fn trace_contours(edges: &GrayImage) -> Vec<TracedContour> {
    find_contours::<u32>(edges)
        .into_iter()
        .map(|c| TracedContour {
            points: simplify_collinear(&c.points),
            is_hole: matches!(c.border_type, BorderType::Hole),
            parent: c.parent,
        })
        .collect()
}

/// Drop the interior points of straight horizontal, vertical and diagonal runs,
/// keeping only the run endpoints.
pub fn simplify_collinear(points: &[Point<u32>]) -> Vec<Point<u32>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let step = |a: &Point<u32>, b: &Point<u32>| {
        (
            (b.x as i64 - a.x as i64).signum(),
            (b.y as i64 - a.y as i64).signum(),
        )
    };

    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let cur = &points[i];
        let next = &points[(i + 1) % n];
        if step(prev, cur) != step(cur, next) {
            out.push(*cur);
        }
    }

    // A degenerate contour (all points on one line segment traced out and back)
    // still needs its extremes
    if out.is_empty() {
        out.push(points[0]);
    }
    out
}

/// Smallest axis-aligned rectangle containing all points (inclusive)
pub fn bounding_rect(points: &[Point<u32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::from_corners(min_x, min_y, max_x, max_y))
}
