//! Property tests for the Bezier engine, collision resolution and phase
//! ordering

use proptest::prelude::*;

use pipeline_canvas::{
    bezier::{distance_from_curve, nearest_point_on_curve, point_on_curve},
    graph::{MagnetRef, Port},
    layout::{overlaps, CollisionResolver},
    CanvasConfig, Graph, PhaseOrder, Point, Shape, ShapeId,
};

const TOLERANCE: f64 = 1e-6;

fn point() -> impl Strategy<Value = Point> {
    (-500.0..500.0f64, -500.0..500.0f64).prop_map(|(x, y)| Point::new(x, y))
}

fn block(label: &str, at: Point) -> Shape {
    Shape::method(label, vec![Port::raw("in")], vec![Port::raw("out")], at)
}

fn step(label: &str, inputs: usize) -> Shape {
    Shape::method(
        label,
        (0..inputs).map(|i| Port::raw(format!("in{}", i))).collect(),
        vec![Port::raw("out")],
        Point::new(300.0, 300.0),
    )
}

/// Closest point of segment `a`-`b` to `p`
fn project_onto_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
    a + ab * t
}

proptest! {
    #[test]
    fn prop_curve_endpoints_are_exact(points in prop::collection::vec(point(), 2..8)) {
        prop_assert_eq!(point_on_curve(&points, 0.0), points[0]);
        prop_assert_eq!(point_on_curve(&points, 1.0), points[points.len() - 1]);
    }

    #[test]
    fn prop_colinear_nearest_point_matches_projection(
        a in point(),
        b in point(),
        p in point(),
    ) {
        prop_assume!(a.distance(b) > 1.0);
        // Control points evenly spaced on the segment
        let curve = [a, a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), b];
        let expected = project_onto_segment(p, a, b);

        let nearest = nearest_point_on_curve(p, &curve);
        prop_assert!(nearest.point.distance(expected) < 1e-4,
            "{:?} vs {:?}", nearest.point, expected);
        prop_assert!((nearest.distance - p.distance(expected)).abs() < 1e-4);

        let found = distance_from_curve(p, &curve);
        prop_assert!((found.location - nearest.location).abs() < TOLERANCE);
    }

    #[test]
    fn prop_even_bias_separates_equally(dx in -70.0..70.0f64, dy in -30.0..30.0f64) {
        prop_assume!(dx.abs() > 1.0 || dy.abs() > 1.0);
        let config = CanvasConfig::default();
        let mut graph = Graph::new();
        let a = graph.add_shape(block("a", Point::new(400.0, 300.0)));
        let b = graph.add_shape(block("b", Point::new(400.0 + dx, 300.0 + dy)));

        CollisionResolver::new(&config).resolve(&mut graph, a, 0.5);

        let (sa, sb) = (graph.shape(a).unwrap(), graph.shape(b).unwrap());
        prop_assert!(!overlaps(sa, sb));
        let moved_a = Point::new(sa.dx, sa.dy).length();
        let moved_b = Point::new(sb.dx, sb.dy).length();
        prop_assert!((moved_a - moved_b).abs() < TOLERANCE, "{} vs {}", moved_a, moved_b);
    }

    #[test]
    fn prop_chains_are_unambiguous(len in 1usize..8) {
        let mut graph = Graph::new();
        let input = graph.add_shape(Shape::raw_input("in", Point::ORIGIN));
        let mut previous = input;
        let mut chain: Vec<ShapeId> = Vec::new();
        for i in 0..len {
            let id = graph.add_shape(step(&format!("s{}", i), 1));
            graph.connect(MagnetRef::output(previous, 0), MagnetRef::input(id, 0)).unwrap();
            chain.push(id);
            previous = id;
        }

        let order = PhaseOrder::compute(&graph).unwrap();
        prop_assert!(!order.is_ambiguous());
        prop_assert!(order.layers().iter().all(|layer| layer.len() == 1));
        prop_assert_eq!(order.flatten(), chain);
    }

    #[test]
    fn prop_independent_siblings_are_ambiguous(siblings in 2usize..6) {
        let mut graph = Graph::new();
        let input = graph.add_shape(Shape::raw_input("in", Point::ORIGIN));
        for i in 0..siblings {
            let id = graph.add_shape(step(&format!("s{}", i), 1));
            graph.connect(MagnetRef::output(input, 0), MagnetRef::input(id, 0)).unwrap();
        }

        let order = PhaseOrder::compute(&graph).unwrap();
        prop_assert!(order.is_ambiguous());
        prop_assert_eq!(order.len(), 1);
        prop_assert_eq!(order.layers()[0].len(), siblings);
    }
}
