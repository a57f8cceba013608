//! Evaluation, subdivision, tangents and arc length

use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use crate::geometry::Point;

/// Parameter increment used when marching along a curve to measure arc length
pub const ARC_STEP: f64 = 0.005;

thread_local! {
    static BINOMIAL_ROWS: RefCell<HashMap<usize, Rc<[f64]>>> = RefCell::new(HashMap::new());
}

/// Binomial coefficients `C(degree, i)` for `i` in `0..=degree`, memoised per degree
fn binomial_row(degree: usize) -> Rc<[f64]> {
    BINOMIAL_ROWS.with(|cache| {
        cache
            .borrow_mut()
            .entry(degree)
            .or_insert_with(|| {
                let mut row = Vec::with_capacity(degree + 1);
                let mut value = 1.0;
                row.push(value);
                for i in 1..=degree {
                    value = value * (degree + 1 - i) as f64 / i as f64;
                    row.push(value);
                }
                row.into()
            })
            .clone()
    })
}

/// Evaluate the curve at `t` in the Bernstein basis.
///
/// Endpoints are exact: `t = 0` yields the first control point and `t = 1`
/// the last. An empty curve evaluates to the origin.
pub fn point_on_curve(curve: &[Point], t: f64) -> Point {
    let Some(degree) = curve.len().checked_sub(1) else {
        return Point::ORIGIN;
    };
    let coefficients = binomial_row(degree);
    let mt = 1.0 - t;

    let mut x = 0.0;
    let mut y = 0.0;
    for (i, p) in curve.iter().enumerate() {
        let weight = coefficients[i] * t.powi(i as i32) * mt.powi((degree - i) as i32);
        x += p.x * weight;
        y += p.y * weight;
    }
    Point::new(x, y)
}

/// de Casteljau evaluation, returning the point together with the left and
/// right sub-curve control points at `t`.
fn de_casteljau(curve: &[Point], t: f64) -> (Point, Vec<Point>, Vec<Point>) {
    let mut level: Vec<Point> = curve.to_vec();
    let mut left = Vec::with_capacity(curve.len());
    let mut right = Vec::with_capacity(curve.len());

    while let (Some(&first), Some(&last)) = (level.first(), level.last()) {
        left.push(first);
        right.push(last);
        if level.len() == 1 {
            break;
        }
        level = level.windows(2).map(|w| w[0].lerp(w[1], t)).collect();
    }
    right.reverse();

    let point = left.last().copied().unwrap_or(Point::ORIGIN);
    (point, left, right)
}

/// Evaluate the curve at `t` by repeated linear interpolation
pub fn evaluate_at(curve: &[Point], t: f64) -> Point {
    de_casteljau(curve, t).0
}

/// Split the curve at `t` into two curves of the same degree
pub fn split(curve: &[Point], t: f64) -> (Vec<Point>, Vec<Point>) {
    let (_, left, right) = de_casteljau(curve, t);
    (left, right)
}

/// Tangent angle at `location`, as `atan(dy/dx)`.
///
/// The derivative of a degree `n` curve is proportional to the difference of
/// the two degree `n - 1` curves formed by its leading and trailing control
/// points. A vertical tangent yields `π/2`.
pub fn gradient_at_point(curve: &[Point], location: f64) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let head = point_on_curve(&curve[..curve.len() - 1], location);
    let tail = point_on_curve(&curve[1..], location);
    let dx = tail.x - head.x;
    let dy = tail.y - head.y;
    if dx == 0.0 {
        FRAC_PI_2
    } else {
        (dy / dx).atan()
    }
}

/// Position on a curve reached by arc-length marching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePosition {
    pub point: Point,
    pub location: f64,
}

fn is_point(curve: &[Point]) -> bool {
    curve.windows(2).all(|w| w[0] == w[1])
}

/// Walk `distance` pixels along the curve starting at `location`.
///
/// Negative distances walk towards the start. The walk stops at either end of
/// the curve if the requested length runs past it.
pub fn point_along_curve_from(curve: &[Point], location: f64, distance: f64) -> CurvePosition {
    let location = location.clamp(0.0, 1.0);
    let mut prev = point_on_curve(curve, location);
    if is_point(curve) {
        return CurvePosition {
            point: prev,
            location,
        };
    }

    let direction = if distance > 0.0 { 1.0 } else { -1.0 };
    let target = distance.abs();
    let mut tally = 0.0;
    let mut current = location;
    let mut point = prev;

    while tally < target {
        let next = current + ARC_STEP * direction;
        if !(0.0..=1.0).contains(&next) {
            current = next.clamp(0.0, 1.0);
            point = point_on_curve(curve, current);
            break;
        }
        current = next;
        point = point_on_curve(curve, current);
        tally += prev.distance(point);
        prev = point;
    }

    CurvePosition {
        point,
        location: current,
    }
}

pub fn location_along_curve_from(curve: &[Point], location: f64, distance: f64) -> f64 {
    point_along_curve_from(curve, location, distance).location
}

/// Approximate arc length by marching the parameter in `ARC_STEP` increments
pub fn get_length(curve: &[Point]) -> f64 {
    if is_point(curve) {
        return 0.0;
    }
    let mut prev = point_on_curve(curve, 0.0);
    let mut tally = 0.0;
    let mut location = 0.0;
    while location < 1.0 {
        location = (location + ARC_STEP).min(1.0);
        let point = point_on_curve(curve, location);
        tally += prev.distance(point);
        prev = point;
    }
    tally
}
