//! Bezier engine
//!
//! Pure functions over control-point sequences of any degree. Connectors only
//! ever use cubic curves, but nothing here assumes degree 3.
//!
//! Nearest-point queries use the Bezier-form root isolation of Schneider's
//! "Solving the Nearest-Point-on-Curve Problem" (Graphics Gems, 1990): the
//! distance derivative is rewritten as a degree `2n - 1` Bezier polynomial and
//! its roots are isolated by recursive subdivision. The recursion stops either
//! when a sub-curve's control polygon is flat to within a tolerance or when a
//! fixed depth is reached, so results are approximations by construction.

pub mod curve;
pub mod nearest;

pub use curve::{
    evaluate_at, get_length, gradient_at_point, location_along_curve_from, point_along_curve_from,
    point_on_curve, split, CurvePosition, ARC_STEP,
};
pub use nearest::{
    distance_from_curve, distance_from_curve_with, nearest_point_on_curve, CurveDistance,
    NearestPoint, RootFinding,
};

use crate::geometry::Point;

/// Control points of a cubic curve: start, two control points, end
pub type CubicCurve = [Point; 4];
