//! Isometric view used for layout aesthetics and reading-order tie-breaks.
//!
//! The view is the canvas rotated by 30°: an isometric x axis running
//! up-right and an isometric y (depth) axis running down-right.
//!
//! ```text
//! iso_x = x·tan(30°) − y
//! iso_y = x·tan(30°) + y
//! ```
//!
//! and the inverse
//!
//! ```text
//! x = (iso_x + iso_y)·cos(30°)
//! y = (iso_y − iso_x) / 2
//! ```

use std::cmp::Ordering;

use super::types::Point;

const TAN_30: f64 = 0.577_350_269_189_625_8;
const COS_30: f64 = 0.866_025_403_784_438_6;

/// Forward and inverse isometric projection
#[derive(Debug, Clone, Copy, Default)]
pub struct IsometricTransform;

impl IsometricTransform {
    pub fn iso_x(point: Point) -> f64 {
        TAN_30 * point.x - point.y
    }

    pub fn iso_y(point: Point) -> f64 {
        TAN_30 * point.x + point.y
    }

    /// Project a canvas point into isometric coordinates
    pub fn to_iso(point: Point) -> Point {
        Point::new(Self::iso_x(point), Self::iso_y(point))
    }

    /// Map isometric coordinates back onto the canvas
    pub fn to_cartesian(iso: Point) -> Point {
        Point::new((iso.x + iso.y) * COS_30, (iso.y - iso.x) / 2.0)
    }

    /// Reading order under the isometric view: depth first, then along the
    /// isometric x axis.
    pub fn reading_order(a: Point, b: Point) -> Ordering {
        Self::iso_y(a)
            .total_cmp(&Self::iso_y(b))
            .then_with(|| Self::iso_x(a).total_cmp(&Self::iso_x(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_round_trip() {
        for p in [
            Point::new(0.0, 0.0),
            Point::new(120.5, -33.0),
            Point::new(-7.0, 400.0),
        ] {
            assert_close(IsometricTransform::to_cartesian(IsometricTransform::to_iso(p)), p);
        }
    }

    #[test]
    fn test_depth_axis_points_down_right() {
        let p = IsometricTransform::to_cartesian(Point::new(0.0, 10.0));
        assert!(p.x > 0.0);
        assert!(p.y > 0.0);
    }

    #[test]
    fn test_reading_order() {
        let upper = Point::new(100.0, 0.0);
        let lower = Point::new(100.0, 50.0);
        assert_eq!(IsometricTransform::reading_order(upper, lower), Ordering::Less);
        assert_eq!(IsometricTransform::reading_order(lower, upper), Ordering::Greater);
        assert_eq!(IsometricTransform::reading_order(upper, upper), Ordering::Equal);
    }
}
