//! Point-to-curve distance by root isolation in Bezier form

use tracing::trace;

use super::curve::{evaluate_at, split};
use crate::geometry::Point;

/// Limits for recursive root isolation.
///
/// Subdivision stops when a sub-curve's control polygon lies within
/// `flatness_tolerance` of its chord, or at `max_recursion` levels. Hitting the
/// depth cap is expected for most queries and still yields a root accurate to
/// `2^-max_recursion` in the curve parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFinding {
    pub max_recursion: u32,
    pub flatness_tolerance: f64,
}

impl RootFinding {
    pub const DEFAULT_MAX_RECURSION: u32 = 64;
}

impl Default for RootFinding {
    fn default() -> Self {
        Self {
            max_recursion: Self::DEFAULT_MAX_RECURSION,
            flatness_tolerance: 2f64.powi(-(Self::DEFAULT_MAX_RECURSION as i32) - 1),
        }
    }
}

/// Squared distance from a point to a curve and where on the curve it occurs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDistance {
    pub location: f64,
    pub distance_squared: f64,
}

impl CurveDistance {
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub point: Point,
    pub location: f64,
    pub distance: f64,
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Rewrite `(B(t) - p) · B'(t)` as a Bezier polynomial of degree `2n - 1`
/// whose control points are `(i / (2n - 1), coefficient)`.
fn convert_to_bezier_form(point: Point, curve: &[Point]) -> Vec<Point> {
    let n = curve.len() - 1;
    let m = n - 1;
    let higher = n + m;

    let c: Vec<Point> = curve.iter().map(|&p| p - point).collect();
    let d: Vec<Point> = curve
        .windows(2)
        .map(|w| (w[1] - w[0]) * n as f64)
        .collect();

    let mut w: Vec<Point> = (0..=higher)
        .map(|i| Point::new(i as f64 / higher as f64, 0.0))
        .collect();

    for k in 0..=higher {
        let lb = k.saturating_sub(m);
        let ub = k.min(n);
        for i in lb..=ub {
            let j = k - i;
            let z = binomial(m, j) * binomial(n, i) / binomial(higher, k);
            w[k].y += d[j].dot(c[i]) * z;
        }
    }
    w
}

fn sign(value: f64) -> i8 {
    if value < 0.0 {
        -1
    } else {
        1
    }
}

fn crossing_count(w: &[Point]) -> usize {
    w.windows(2)
        .filter(|pair| sign(pair[0].y) != sign(pair[1].y))
        .count()
}

fn is_flat_enough(w: &[Point], tolerance: f64) -> bool {
    let first = w[0];
    let last = w[w.len() - 1];
    let a = first.y - last.y;
    let b = last.x - first.x;
    let c = first.x * last.y - last.x * first.y;

    let mut max_above: f64 = 0.0;
    let mut max_below: f64 = 0.0;
    for p in &w[1..w.len() - 1] {
        let value = a * p.x + b * p.y + c;
        if value > max_above {
            max_above = value;
        } else if value < max_below {
            max_below = value;
        }
    }

    // Intercepts of the two chord-parallel lines bounding the polygon with y = 0
    let det = -a;
    let intercept_above = (c - max_above) / det;
    let intercept_below = (c - max_below) / det;
    let error = (intercept_above - intercept_below).abs();
    error < tolerance
}

/// Where the chord from the first to the last control point meets y = 0
fn x_intercept(w: &[Point]) -> f64 {
    let first = w[0];
    let last = w[w.len() - 1];
    let xnm = last.x - first.x;
    let ynm = last.y - first.y;
    let det = -ynm;
    (xnm * first.y - ynm * first.x) / det
}

fn find_roots(w: &[Point], depth: u32, limits: &RootFinding, roots: &mut Vec<f64>) {
    let degree = w.len() - 1;
    match crossing_count(w) {
        0 => return,
        1 => {
            if depth >= limits.max_recursion {
                roots.push((w[0].x + w[degree].x) / 2.0);
                return;
            }
            if is_flat_enough(w, limits.flatness_tolerance) {
                roots.push(x_intercept(w));
                return;
            }
        }
        crossings => {
            if depth >= limits.max_recursion {
                trace!(crossings, "root isolation hit depth cap with several crossings");
                roots.push((w[0].x + w[degree].x) / 2.0);
                return;
            }
        }
    }

    let (left, right) = split(w, 0.5);
    find_roots(&left, depth + 1, limits, roots);
    find_roots(&right, depth + 1, limits, roots);
}

/// Squared distance from `point` to `curve` with the default limits
pub fn distance_from_curve(point: Point, curve: &[Point]) -> CurveDistance {
    distance_from_curve_with(point, curve, &RootFinding::default())
}

pub fn distance_from_curve_with(point: Point, curve: &[Point], limits: &RootFinding) -> CurveDistance {
    let Some(&start) = curve.first() else {
        return CurveDistance {
            location: 0.0,
            distance_squared: point.length_squared(),
        };
    };

    let mut best = CurveDistance {
        location: 0.0,
        distance_squared: (point - start).length_squared(),
    };
    if curve.len() == 1 {
        return best;
    }

    let w = convert_to_bezier_form(point, curve);
    let mut roots = Vec::new();
    find_roots(&w, 0, limits, &mut roots);

    let end = (1.0, curve[curve.len() - 1]);
    let candidates = roots
        .into_iter()
        .filter(|t| t.is_finite())
        .map(|t| {
            let t = t.clamp(0.0, 1.0);
            (t, evaluate_at(curve, t))
        })
        .chain(std::iter::once(end));

    for (location, on_curve) in candidates {
        let distance_squared = (point - on_curve).length_squared();
        if distance_squared < best.distance_squared {
            best = CurveDistance {
                location,
                distance_squared,
            };
        }
    }
    best
}

/// Closest point on `curve` to `point`
pub fn nearest_point_on_curve(point: Point, curve: &[Point]) -> NearestPoint {
    let found = distance_from_curve(point, curve);
    NearestPoint {
        point: evaluate_at(curve, found.location),
        location: found.location,
        distance: found.distance(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bezier::point_on_curve;

    const EPS: f64 = 1e-6;

    fn colinear() -> Vec<Point> {
        // Uneven spacing so the parameterisation is not linear in arc length
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(70.0, 70.0),
            Point::new(100.0, 100.0),
        ]
    }

    fn s_curve() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        ]
    }

    /// Closed-form projection of `p` onto the segment `a`..`b`
    fn project_onto_segment(p: Point, a: Point, b: Point) -> Point {
        let ab = b - a;
        let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
        a + ab * t
    }

    #[test]
    fn test_z_weights_for_cubic() {
        // The classic table for n = 3, m = 2
        assert!((binomial(2, 0) * binomial(3, 1) / binomial(5, 1) - 0.6).abs() < 1e-12);
        assert!((binomial(2, 1) * binomial(3, 0) / binomial(5, 1) - 0.4).abs() < 1e-12);
        assert!((binomial(2, 2) * binomial(3, 3) / binomial(5, 5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_colinear_curve_matches_segment_projection() {
        let curve = colinear();
        for p in [
            Point::new(0.0, 100.0),
            Point::new(30.0, 10.0),
            Point::new(90.0, 40.0),
        ] {
            let expected = project_onto_segment(p, curve[0], curve[3]);
            let found = nearest_point_on_curve(p, &curve);
            assert!(
                found.point.distance(expected) < EPS,
                "p={:?} found={:?} expected={:?}",
                p,
                found.point,
                expected
            );
            assert!((found.distance - p.distance(expected)).abs() < EPS);
            assert!(point_on_curve(&curve, found.location).distance(expected) < EPS);
        }
    }

    #[test]
    fn test_beyond_the_end_picks_endpoint() {
        let curve = colinear();
        let found = distance_from_curve(Point::new(150.0, 160.0), &curve);
        assert_eq!(found.location, 1.0);
        assert_eq!(found.distance_squared, 50.0 * 50.0 + 60.0 * 60.0);

        let found = distance_from_curve(Point::new(-5.0, -5.0), &curve);
        assert_eq!(found.location, 0.0);
    }

    #[test]
    fn test_point_on_curve_has_zero_distance() {
        let curve = s_curve();
        for t in [0.1, 0.3, 0.5, 0.8] {
            let on = point_on_curve(&curve, t);
            let found = distance_from_curve(on, &curve);
            assert!(found.distance() < EPS, "t={} found={:?}", t, found);
            assert!((found.location - t).abs() < 1e-4, "t={} found={:?}", t, found);
        }
    }

    #[test]
    fn test_nearest_beats_sampling() {
        let curve = s_curve();
        let p = Point::new(80.0, 30.0);
        let found = nearest_point_on_curve(p, &curve);
        for i in 0..=1000 {
            let sample = point_on_curve(&curve, i as f64 / 1000.0);
            assert!(found.distance <= p.distance(sample) + 1e-9);
        }
    }

    #[test]
    fn test_linear_curve() {
        let segment = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let found = nearest_point_on_curve(Point::new(4.0, 3.0), &segment);
        assert!(found.point.distance(Point::new(4.0, 0.0)) < EPS);
        assert!((found.location - 0.4).abs() < EPS);
        assert!((found.distance - 3.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_curves() {
        let single = [Point::new(1.0, 1.0)];
        let found = distance_from_curve(Point::new(4.0, 5.0), &single);
        assert_eq!(found.distance_squared, 25.0);
        assert_eq!(distance_from_curve(Point::new(3.0, 4.0), &[]).distance(), 5.0);
    }

    #[test]
    fn test_shallow_recursion_still_returns_a_candidate() {
        let limits = RootFinding {
            max_recursion: 3,
            ..RootFinding::default()
        };
        let curve = s_curve();
        let p = Point::new(50.0, 50.0);
        let found = distance_from_curve_with(p, &curve, &limits);
        assert!(found.distance_squared.is_finite());
        assert!((0.0..=1.0).contains(&found.location));
    }
}
