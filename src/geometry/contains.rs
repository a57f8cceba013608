//! Point containment tests for the primitive outlines shapes are built from

use super::types::{BoundingBox, Point};

/// Even-odd ray casting test against a closed polygon.
///
/// Points exactly on an edge may fall either way; callers treat the outline
/// as approximate anyway.
pub fn polygon_contains(polygon: &[Point], point: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned ellipse centred on `center` with radii `rx`, `ry`
pub fn ellipse_contains(center: Point, rx: f64, ry: f64, point: Point) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let nx = (point.x - center.x) / rx;
    let ny = (point.y - center.y) / ry;
    nx * nx + ny * ny <= 1.0
}

pub fn rect_contains(rect: &BoundingBox, point: Point) -> bool {
    rect.contains(point)
}
