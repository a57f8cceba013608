//! Pushing overlapping shapes apart
//!
//! A relaxation, not a solver: every overlap found is answered with a small
//! fixed push along the line joining the two centres, after which the scan
//! restarts. Shapes knocked aside get their own pass afterwards. Both loops are
//! capped, and hitting a cap simply leaves the best positions found so far.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::geometry::{BoundingBox, Point};
use crate::graph::{Graph, Shape, ShapeId};

use super::config::CanvasConfig;

/// What a resolution pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Number of pushes applied, knock-on passes included
    pub pushes: usize,
    /// Shapes other than the mover that were displaced
    pub displaced: Vec<ShapeId>,
    /// A push or depth cap stopped the pass early
    pub capped: bool,
}

/// Resolves overlaps on one canvas against an optional fixed obstacle
pub struct CollisionResolver<'a> {
    config: &'a CanvasConfig,
    bounds: BoundingBox,
    obstacle: Option<&'a Shape>,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(config: &'a CanvasConfig) -> Self {
        Self {
            config,
            bounds: config.bounds(),
            obstacle: None,
        }
    }

    /// Add an immovable shape, such as the output zone, to every pass
    pub fn with_obstacle(mut self, obstacle: &'a Shape) -> Self {
        self.obstacle = Some(obstacle);
        self
    }

    /// Separate `mover` from everything it overlaps.
    ///
    /// `bias` is the share of each push taken by the other shape; the mover
    /// takes the rest. Pushes against the fixed obstacle go wholly to the
    /// mover. Displacement accumulates in the shapes' transient offsets.
    pub fn resolve(&self, graph: &mut Graph, mover: ShapeId, bias: f64) -> CollisionReport {
        let mut report = CollisionReport::default();
        let mut scheduled = HashSet::from([mover]);
        self.resolve_from(graph, mover, bias, 0, &mut scheduled, &mut report);
        if report.pushes > 0 {
            debug!(?mover, pushes = report.pushes, displaced = report.displaced.len(), "resolved collisions");
        }
        report
    }

    fn resolve_from(
        &self,
        graph: &mut Graph,
        mover: ShapeId,
        bias: f64,
        depth: usize,
        scheduled: &mut HashSet<ShapeId>,
        report: &mut CollisionReport,
    ) {
        let mut followups = Vec::new();
        let mut pushes = 0;

        'scan: loop {
            if pushes >= self.config.max_pushes {
                warn!(?mover, pushes, "collision pass hit its push limit");
                report.capped = true;
                break;
            }
            let Some(shape) = graph.shape(mover) else {
                return;
            };
            if shape.is_immovable() {
                return;
            }

            if let Some(obstacle) = self.obstacle {
                if overlaps(shape, obstacle) {
                    let push = self.fixed_push(shape, obstacle.centre());
                    self.apply(graph, mover, push, None);
                    pushes += 1;
                    continue 'scan;
                }
            }

            let hit = graph
                .shapes()
                .find(|&(id, other)| id != mover && overlaps(shape, other))
                .map(|(id, other)| (id, other.centre(), other.is_immovable()));
            if let Some((other, other_centre, fixed)) = hit {
                if fixed {
                    let push = self.fixed_push(shape, other_centre);
                    self.apply(graph, mover, push, None);
                } else {
                    let push = self.push_vector(shape.centre(), other_centre);
                    self.apply(graph, mover, push * (1.0 - bias), Some((other, push * -bias)));
                    if bias > 0.0 && scheduled.insert(other) {
                        followups.push(other);
                        report.displaced.push(other);
                    }
                }
                pushes += 1;
                continue 'scan;
            }

            break;
        }
        report.pushes += pushes;

        if followups.is_empty() {
            return;
        }
        if depth >= self.config.max_followup_depth {
            warn!(?mover, depth, "collision follow-ups hit their depth limit");
            report.capped = true;
            return;
        }
        for other in followups {
            self.resolve_from(graph, other, bias, depth + 1, scheduled, report);
        }
    }

    /// A push of one step from `obstacle` towards `mover`
    fn push_vector(&self, mover: Point, obstacle: Point) -> Point {
        let delta = mover - obstacle;
        let length = delta.length();
        if length < f64::EPSILON {
            return Point::new(self.config.step, 0.0);
        }
        delta * (self.config.step / length)
    }

    /// Push away from a fixed obstacle. When the canvas edge would swallow
    /// the whole push, head for the middle of the canvas instead.
    fn fixed_push(&self, shape: &Shape, obstacle: Point) -> Point {
        let push = self.push_vector(shape.centre(), obstacle);
        let blocked = (push + self.overflow(Some(shape), push)).length() < self.config.step / 2.0;
        if blocked || (shape.centre() - obstacle).length() < f64::EPSILON {
            let towards_middle = self.push_vector(self.bounds.center(), obstacle);
            if towards_middle != Point::ORIGIN {
                return towards_middle;
            }
        }
        push
    }

    /// Move the mover and the other shape, keeping both on the canvas. Ground
    /// one shape loses against a canvas edge is made up by the other.
    fn apply(&self, graph: &mut Graph, mover: ShapeId, push: Point, other: Option<(ShapeId, Point)>) {
        let mut mover_push = push;
        let mut other_push = other.map(|(_, p)| p).unwrap_or_default();

        let correction = self.overflow(graph.shape(mover), mover_push);
        mover_push = mover_push + correction;
        if let Some((other_id, _)) = other {
            other_push = other_push + correction;
            let correction = self.overflow(graph.shape(other_id), other_push);
            other_push = other_push + correction;
            mover_push = mover_push + correction;
            mover_push = mover_push + self.overflow(graph.shape(mover), mover_push);
            if let Err(e) = graph.translate(other_id, other_push.x, other_push.y) {
                debug!(%e, "push skipped");
            }
        }
        if let Err(e) = graph.translate(mover, mover_push.x, mover_push.y) {
            debug!(%e, "push skipped");
        }
    }

    /// Shift needed to bring `shape`, moved by `push`, back inside the canvas
    fn overflow(&self, shape: Option<&Shape>, push: Point) -> Point {
        let Some(shape) = shape else {
            return Point::ORIGIN;
        };
        let b = shape.bounds();
        let (x, y) = (b.x + push.x, b.y + push.y);
        let axis = |start: f64, size: f64, lo: f64, hi: f64| {
            if size >= hi - lo {
                (lo + hi) / 2.0 - (start + size / 2.0)
            } else if start < lo {
                lo - start
            } else if start + size > hi {
                hi - (start + size)
            } else {
                0.0
            }
        };
        Point::new(
            axis(x, b.width, self.bounds.x, self.bounds.right()),
            axis(y, b.height, self.bounds.y, self.bounds.bottom()),
        )
    }
}

/// Any probe vertex of either shape lies inside the other
pub fn overlaps(a: &Shape, b: &Shape) -> bool {
    a.vertices().into_iter().any(|v| b.contains(v)) || b.vertices().into_iter().any(|v| a.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Port;

    fn block(label: &str, at: Point) -> Shape {
        Shape::method(label, vec![Port::raw("in")], vec![Port::raw("out")], at)
    }

    fn config() -> CanvasConfig {
        CanvasConfig::default()
    }

    #[test]
    fn test_separated_shapes_are_left_alone() {
        let config = config();
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(100.0, 100.0)));
        g.add_shape(block("b", Point::new(300.0, 100.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.5);
        assert_eq!(report.pushes, 0);
        assert_eq!(g.shape(a).unwrap().centre(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_even_bias_splits_the_push() {
        let config = config();
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(200.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(240.0, 310.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.5);

        let (sa, sb) = (g.shape(a).unwrap(), g.shape(b).unwrap());
        assert!(report.pushes > 0);
        assert!(!overlaps(sa, sb));
        let moved_a = Point::new(sa.dx, sa.dy).length();
        let moved_b = Point::new(sb.dx, sb.dy).length();
        assert!((moved_a - moved_b).abs() < 1e-9, "{} vs {}", moved_a, moved_b);
    }

    #[test]
    fn test_zero_bias_moves_only_the_mover() {
        let config = config();
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(200.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(220.0, 300.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.0);
        assert!(report.displaced.is_empty());
        let sb = g.shape(b).unwrap();
        assert_eq!((sb.dx, sb.dy), (0.0, 0.0));
        assert!(g.shape(a).unwrap().dx < 0.0);
    }

    #[test]
    fn test_canvas_edge_pushes_the_other_shape_further() {
        let config = config();
        let mut g = Graph::new();
        // Mover pinned against the left edge, obstacle to its right
        let a = g.add_shape(block("a", Point::new(40.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(60.0, 300.0)));
        CollisionResolver::new(&config).resolve(&mut g, a, 0.5);

        let (sa, sb) = (g.shape(a).unwrap(), g.shape(b).unwrap());
        assert!(sa.bounds().x >= -1e-9);
        assert!(!overlaps(sa, sb));
        assert!(sb.dx > 0.0);
    }

    #[test]
    fn test_obstacle_never_moves() {
        let config = config();
        let zone = Shape::output_zone(config.output_zone_bounds());
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(700.0, 40.0)));
        CollisionResolver::new(&config)
            .with_obstacle(&zone)
            .resolve(&mut g, a, 0.75);
        assert!(!overlaps(g.shape(a).unwrap(), &zone));
        assert_eq!(zone.bounds(), config.output_zone_bounds());
    }

    #[test]
    fn test_knock_on_collisions_are_followed() {
        let config = config();
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(300.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(350.0, 300.0)));
        let c = g.add_shape(block("c", Point::new(432.0, 300.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.5);

        assert!(report.displaced.contains(&b));
        for (x, y) in [(a, b), (b, c), (a, c)] {
            assert!(!overlaps(g.shape(x).unwrap(), g.shape(y).unwrap()));
        }
    }

    #[test]
    fn test_push_cap_keeps_best_positions() {
        let config = config().with_max_pushes(1);
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(200.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(205.0, 300.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.5);

        assert!(report.capped);
        let (sa, sb) = (g.shape(a).unwrap(), g.shape(b).unwrap());
        assert!(sa.centre().is_finite() && sb.centre().is_finite());
        assert!(overlaps(sa, sb));
        assert!(sa.dx < 0.0);
    }

    #[test]
    fn test_followup_depth_cap_stops_knock_on() {
        let config = config().with_max_followup_depth(0);
        let mut g = Graph::new();
        let a = g.add_shape(block("a", Point::new(300.0, 300.0)));
        let b = g.add_shape(block("b", Point::new(350.0, 300.0)));
        let c = g.add_shape(block("c", Point::new(432.0, 300.0)));
        let report = CollisionResolver::new(&config).resolve(&mut g, a, 0.5);

        assert!(report.capped);
        assert_eq!(report.displaced, vec![b]);
        assert!(!overlaps(g.shape(a).unwrap(), g.shape(b).unwrap()));
        // b was pushed into c, but nothing followed up on it
        assert!(overlaps(g.shape(b).unwrap(), g.shape(c).unwrap()));
        let sc = g.shape(c).unwrap();
        assert_eq!((sc.dx, sc.dy), (0.0, 0.0));
    }
}
