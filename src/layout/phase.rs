//! Layered execution order of the steps in a graph
//!
//! Steps are grouped into phases: every step of a phase has all of its inputs
//! cabled, and every step feeding it sits in an earlier phase. A phase with
//! more than one step means the graph alone does not fix the run order; those
//! steps are then ordered by where they sit on the canvas.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::geometry::IsometricTransform;
use crate::graph::{Graph, ShapeId};

use super::error::LayoutError;

/// Steps grouped into phases, first phase first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseOrder {
    layers: Vec<Vec<ShapeId>>,
}

impl PhaseOrder {
    /// Compute the phases of every step in `graph`.
    ///
    /// Fails when some step can never become eligible, which happens when one
    /// of its input magnets (or one of an upstream step's) has no cable.
    pub fn compute(graph: &Graph) -> Result<Self, LayoutError> {
        let limit = graph.methods().len() + 1;
        let mut placed: HashSet<ShapeId> = HashSet::new();
        let mut remaining: Vec<ShapeId> = graph.methods().to_vec();
        let mut layers = Vec::new();
        let mut rounds = 0;

        while !remaining.is_empty() {
            rounds += 1;
            if rounds > limit {
                warn!(limit, "phase ordering hit its round limit");
                return Err(LayoutError::iteration_cap(limit));
            }

            let (layer, rest): (Vec<ShapeId>, Vec<ShapeId>) = remaining
                .into_iter()
                .partition(|&id| Self::is_eligible(graph, id, &placed));
            remaining = rest;

            if layer.is_empty() {
                let unplaced = remaining
                    .iter()
                    .filter_map(|&id| graph.shape(id))
                    .map(|s| s.label.clone())
                    .collect();
                return Err(LayoutError::indeterminate(unplaced));
            }

            placed.extend(layer.iter().copied());
            layers.push(layer);
        }

        let mut order = Self { layers };
        order.sort_ambiguous(graph);
        debug!(phases = order.layers.len(), ambiguous = order.is_ambiguous(), "computed phase order");
        Ok(order)
    }

    /// Every input magnet is cabled and every upstream step is already placed
    fn is_eligible(graph: &Graph, id: ShapeId, placed: &HashSet<ShapeId>) -> bool {
        graph.input_sources(id).into_iter().all(|source| match source {
            Some(source) => {
                let upstream_is_step = graph.shape(source).is_some_and(|s| s.affects_exec_order());
                !upstream_is_step || placed.contains(&source)
            }
            None => false,
        })
    }

    pub fn layers(&self) -> &[Vec<ShapeId>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// More than one step shares a phase
    pub fn is_ambiguous(&self) -> bool {
        self.layers.iter().any(|layer| layer.len() > 1)
    }

    /// Index of the phase holding `id`
    pub fn phase_of(&self, id: ShapeId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(&id))
    }

    /// All steps in run order
    pub fn flatten(&self) -> Vec<ShapeId> {
        self.layers.iter().flatten().copied().collect()
    }

    /// Re-sort every shared phase by isometric reading order of the step
    /// positions. Call again whenever a step in such a phase moves.
    pub fn sort_ambiguous(&mut self, graph: &Graph) {
        for layer in self.layers.iter_mut().filter(|l| l.len() > 1) {
            layer.sort_by(|&a, &b| {
                match (graph.shape(a), graph.shape(b)) {
                    (Some(a), Some(b)) => IsometricTransform::reading_order(a.centre(), b.centre()),
                    _ => std::cmp::Ordering::Equal,
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::graph::{MagnetRef, Port, Shape};

    fn step(label: &str, inputs: usize, at: Point) -> Shape {
        Shape::method(
            label,
            (0..inputs).map(|i| Port::raw(format!("in{}", i))).collect(),
            vec![Port::raw("out")],
            at,
        )
    }

    fn cable(g: &mut Graph, from: ShapeId, to: ShapeId, index: usize) {
        g.connect(MagnetRef::output(from, 0), MagnetRef::input(to, index))
            .unwrap();
    }

    #[test]
    fn test_chain_is_unambiguous() {
        let mut g = Graph::new();
        let a = g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let m1 = g.add_shape(step("m1", 1, Point::new(300.0, 0.0)));
        let m2 = g.add_shape(step("m2", 1, Point::new(100.0, 0.0)));
        cable(&mut g, a, m1, 0);
        cable(&mut g, m1, m2, 0);

        let order = PhaseOrder::compute(&g).unwrap();
        assert_eq!(order.layers(), &[vec![m1], vec![m2]]);
        assert!(!order.is_ambiguous());
        assert_eq!(order.phase_of(m2), Some(1));
    }

    #[test]
    fn test_siblings_share_a_phase() {
        let mut g = Graph::new();
        let a = g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let right = g.add_shape(step("right", 1, Point::new(400.0, 100.0)));
        let left = g.add_shape(step("left", 1, Point::new(100.0, 100.0)));
        cable(&mut g, a, right, 0);
        cable(&mut g, a, left, 0);

        let order = PhaseOrder::compute(&g).unwrap();
        assert!(order.is_ambiguous());
        assert_eq!(order.layers(), &[vec![left, right]]);
    }

    #[test]
    fn test_reordering_follows_moves() {
        let mut g = Graph::new();
        let a = g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let first = g.add_shape(step("first", 1, Point::new(100.0, 100.0)));
        let second = g.add_shape(step("second", 1, Point::new(100.0, 300.0)));
        cable(&mut g, a, first, 0);
        cable(&mut g, a, second, 0);

        let mut order = PhaseOrder::compute(&g).unwrap();
        assert_eq!(order.flatten(), vec![first, second]);

        g.set_position(first, Point::new(100.0, 500.0)).unwrap();
        order.sort_ambiguous(&g);
        assert_eq!(order.flatten(), vec![second, first]);
    }

    #[test]
    fn test_step_waits_for_all_upstream_steps() {
        let mut g = Graph::new();
        let a = g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let m1 = g.add_shape(step("m1", 1, Point::ORIGIN));
        let m2 = g.add_shape(step("m2", 1, Point::ORIGIN));
        let join = g.add_shape(step("join", 2, Point::ORIGIN));
        cable(&mut g, a, m1, 0);
        cable(&mut g, m1, m2, 0);
        cable(&mut g, m1, join, 0);
        cable(&mut g, m2, join, 1);

        let order = PhaseOrder::compute(&g).unwrap();
        assert_eq!(order.layers(), &[vec![m1], vec![m2], vec![join]]);
    }

    #[test]
    fn test_unconnected_input_is_indeterminate() {
        let mut g = Graph::new();
        let a = g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let m1 = g.add_shape(step("m1", 1, Point::ORIGIN));
        let m2 = g.add_shape(step("m2", 2, Point::ORIGIN));
        cable(&mut g, a, m1, 0);
        cable(&mut g, m1, m2, 0);

        assert_eq!(
            PhaseOrder::compute(&g),
            Err(LayoutError::indeterminate(vec!["m2".to_string()]))
        );
    }

    #[test]
    fn test_no_steps_is_empty_order() {
        let mut g = Graph::new();
        g.add_shape(Shape::raw_input("a", Point::ORIGIN));
        let order = PhaseOrder::compute(&g).unwrap();
        assert!(order.is_empty());
        assert!(!order.is_ambiguous());
    }
}
