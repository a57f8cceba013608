//! The interaction-facing canvas
//!
//! [`Canvas`] owns one [`Graph`] together with the configuration, the output
//! zone and the current execution order, and keeps them in step as shapes and
//! cables are added, dragged, dropped and deleted. It never sees raw input
//! events: the caller translates pointer activity into these calls.

use tracing::debug;

use crate::bezier::{distance_from_curve, get_length, point_along_curve_from};
use crate::geometry::Point;
use crate::graph::{
    ConnectorId, Graph, GraphError, MagnetRef, MagnetSide, ObjectRef, ReplaceOutcome, Shape,
    ShapeId, MAGNET_RADIUS,
};
use crate::layout::{
    self, CanvasConfig, CollisionReport, CollisionResolver, LayoutError, PhaseOrder,
};

/// What happened to a cable released over the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Landed on a free, compatible input magnet
    Attached(MagnetRef),
    /// Landed in the output zone; a new output node was created for it
    CreatedOutput(ShapeId),
    /// Landed anywhere else and was removed
    Discarded,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    graph: Graph,
    config: CanvasConfig,
    output_zone: Shape,
    exec_order: Option<PhaseOrder>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self::from_graph(Graph::new(), config)
    }

    /// Wrap an existing graph, computing its execution order
    pub fn from_graph(graph: Graph, config: CanvasConfig) -> Self {
        let output_zone = Shape::output_zone(config.output_zone_bounds());
        let mut canvas = Self {
            graph,
            config,
            output_zone,
            exec_order: None,
        };
        canvas.update_exec_order();
        canvas
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn output_zone(&self) -> &Shape {
        &self.output_zone
    }

    fn resolve(&mut self, id: ShapeId, bias: f64) -> CollisionReport {
        CollisionResolver::new(&self.config)
            .with_obstacle(&self.output_zone)
            .resolve(&mut self.graph, id, bias)
    }

    // ==================================================================
    // Shapes
    // ==================================================================

    /// Place a new shape and push it clear of anything it lands on
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let affects_order = shape.affects_exec_order();
        let id = self.graph.add_shape(shape);
        let report = self.resolve(id, self.config.drag_bias);
        self.graph.fold_offsets();
        if affects_order {
            self.update_exec_order();
        } else if self.moved_a_step(id, &report) {
            self.sort_ambiguous_phases();
        }
        id
    }

    /// Drag a shape by `(dx, dy)`, resolving any collisions it causes.
    ///
    /// The movement stays in the transient offsets until [`Canvas::finish_drag`].
    pub fn move_shape(&mut self, id: ShapeId, dx: f64, dy: f64) -> Result<CollisionReport, GraphError> {
        self.graph.translate(id, dx, dy)?;
        let report = self.resolve(id, self.config.drag_bias);
        if self.moved_a_step(id, &report) {
            self.sort_ambiguous_phases();
        }
        Ok(report)
    }

    /// The mover or anything it pushed aside is a step
    fn moved_a_step(&self, mover: ShapeId, report: &CollisionReport) -> bool {
        std::iter::once(&mover)
            .chain(&report.displaced)
            .any(|&id| self.graph.shape(id).is_some_and(Shape::affects_exec_order))
    }

    /// Fold every transient offset into the resting positions
    pub fn finish_drag(&mut self) {
        self.graph.fold_offsets();
        self.sort_ambiguous_phases();
    }

    /// Delete a shape or cable, with the graph's cascades
    pub fn delete(&mut self, object: ObjectRef) -> Result<(), GraphError> {
        self.graph.delete_object(object)?;
        self.update_exec_order();
        Ok(())
    }

    /// Swap one step for another in place
    pub fn replace_method(&mut self, old: ShapeId, replacement: Shape) -> Result<ReplaceOutcome, GraphError> {
        let outcome = self.graph.replace_method(old, replacement)?;
        self.update_exec_order();
        Ok(outcome)
    }

    // ==================================================================
    // Cables
    // ==================================================================

    /// Begin dragging a new cable out of an output magnet
    pub fn start_connector(&mut self, source: MagnetRef) -> Result<ConnectorId, GraphError> {
        self.graph.start_connector(source)
    }

    pub fn drag_connector(&mut self, id: ConnectorId, point: Point) -> Result<(), GraphError> {
        self.graph.set_connector_end(id, point)
    }

    /// Release a dragged cable at `point`
    pub fn drop_connector(&mut self, id: ConnectorId, point: Point) -> Result<DropOutcome, GraphError> {
        let source = self
            .graph
            .connector(id)
            .ok_or(GraphError::UnknownConnector(id))?
            .source();

        let outcome = if let Some(dest) = self.magnet_at(point).filter(|m| m.side == MagnetSide::Input) {
            match self.graph.attach_connector(id, dest) {
                Ok(()) => DropOutcome::Attached(dest),
                Err(e) => {
                    debug!(%e, "cable rejected");
                    self.graph.delete_connector(id)?;
                    DropOutcome::Discarded
                }
            }
        } else if self.output_zone.contains(point) {
            let cdt = self.graph.magnet(source).and_then(|m| m.cdt);
            let label = self.unique_output_label();
            let output = self.graph.add_shape(Shape::output(label, cdt, point));
            if let Err(e) = self.graph.attach_connector(id, MagnetRef::input(output, 0)) {
                self.graph.delete_shape(output)?;
                return Err(e);
            }
            self.resolve(output, self.config.drag_bias);
            self.graph.fold_offsets();
            DropOutcome::CreatedOutput(output)
        } else {
            self.graph.delete_connector(id)?;
            DropOutcome::Discarded
        };

        self.update_exec_order();
        Ok(outcome)
    }

    /// First `output_N` label not yet taken
    fn unique_output_label(&self) -> String {
        (1..)
            .map(|n| format!("output_{}", n))
            .find(|label| !self.graph.shapes().any(|(_, s)| &s.label == label))
            .unwrap_or_default()
    }

    /// Label anchor: the point halfway along a cable
    pub fn connector_midpoint(&self, id: ConnectorId) -> Option<Point> {
        let curve = self.graph.connector_curve(id)?;
        let half = get_length(&curve) / 2.0;
        Some(point_along_curve_from(&curve, 0.0, half).point)
    }

    // ==================================================================
    // Hit testing, topmost first
    // ==================================================================

    pub fn shape_at(&self, point: Point) -> Option<ShapeId> {
        self.graph
            .shape_ids()
            .iter()
            .rev()
            .copied()
            .find(|&id| self.graph.shape(id).is_some_and(|s| s.contains(point)))
    }

    pub fn magnet_at(&self, point: Point) -> Option<MagnetRef> {
        let reach = MAGNET_RADIUS + self.config.hit_padding;
        for &id in self.graph.shape_ids().iter().rev() {
            let Some(shape) = self.graph.shape(id) else {
                continue;
            };
            for side in [MagnetSide::Input, MagnetSide::Output] {
                let hit = shape
                    .magnets(side)
                    .iter()
                    .position(|m| shape.magnet_position(m).distance(point) <= reach);
                if let Some(index) = hit {
                    return Some(MagnetRef { shape: id, side, index });
                }
            }
        }
        None
    }

    pub fn connector_at(&self, point: Point) -> Option<ConnectorId> {
        self.graph.connector_ids().iter().rev().copied().find(|&id| {
            self.graph
                .connector_curve(id)
                .is_some_and(|curve| distance_from_curve(point, &curve).distance() < self.config.hit_padding)
        })
    }

    // ==================================================================
    // Execution order and layout
    // ==================================================================

    /// Recompute the execution order; `None` while some step is not wired up
    pub fn update_exec_order(&mut self) -> Option<&PhaseOrder> {
        self.exec_order = match PhaseOrder::compute(&self.graph) {
            Ok(order) => Some(order),
            Err(e) => {
                debug!(%e, "no execution order");
                None
            }
        };
        self.exec_order.as_ref()
    }

    pub fn exec_order(&self) -> Option<&PhaseOrder> {
        self.exec_order.as_ref()
    }

    pub fn is_exec_order_ambiguous(&self) -> bool {
        self.exec_order.as_ref().is_some_and(PhaseOrder::is_ambiguous)
    }

    fn sort_ambiguous_phases(&mut self) {
        if let Some(order) = self.exec_order.as_mut().filter(|o| o.is_ambiguous()) {
            order.sort_ambiguous(&self.graph);
        }
    }

    /// Lay the whole pipeline out again. On error nothing moves.
    pub fn auto_layout(&mut self) -> Result<Vec<Vec<ShapeId>>, LayoutError> {
        let order = PhaseOrder::compute(&self.graph)?;
        let layers = layout::auto_layout(&mut self.graph, &order, &self.config, Some(&self.output_zone))?;
        self.update_exec_order();
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Cdt, Port};
    use crate::layout::overlaps;

    fn step(label: &str, inputs: usize, at: Point) -> Shape {
        Shape::method(
            label,
            (0..inputs).map(|i| Port::raw(format!("in{}", i))).collect(),
            vec![Port::raw("out")],
            at,
        )
    }

    #[test]
    fn test_add_shape_pushes_clear() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(step("a", 1, Point::new(200.0, 300.0)));
        let b = canvas.add_shape(step("b", 1, Point::new(210.0, 300.0)));
        let g = canvas.graph();
        assert!(!overlaps(g.shape(a).unwrap(), g.shape(b).unwrap()));
        assert_eq!(g.shape(b).unwrap().dx, 0.0);
    }

    #[test]
    fn test_shapes_are_kept_out_of_the_output_zone() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(step("a", 1, Point::new(720.0, 40.0)));
        assert!(!overlaps(canvas.graph().shape(a).unwrap(), canvas.output_zone()));
    }

    #[test]
    fn test_drag_and_finish() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(step("a", 1, Point::new(200.0, 300.0)));
        canvas.move_shape(a, 30.0, 10.0).unwrap();
        assert_eq!(canvas.graph().shape(a).unwrap().x, 200.0);
        canvas.finish_drag();
        let shape = canvas.graph().shape(a).unwrap();
        assert_eq!((shape.x, shape.y, shape.dx), (230.0, 310.0, 0.0));
    }

    #[test]
    fn test_drop_on_magnet_attaches() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::raw_input("a", Point::new(100.0, 300.0)));
        let m = canvas.add_shape(step("m", 1, Point::new(300.0, 300.0)));
        assert!(canvas.exec_order().is_none());

        let cable = canvas.start_connector(MagnetRef::output(a, 0)).unwrap();
        let target = canvas
            .graph()
            .magnet_position(MagnetRef::input(m, 0))
            .unwrap();
        canvas.drag_connector(cable, target).unwrap();
        let outcome = canvas.drop_connector(cable, target).unwrap();

        assert_eq!(outcome, DropOutcome::Attached(MagnetRef::input(m, 0)));
        assert_eq!(canvas.exec_order().unwrap().layers(), &[vec![m]]);
    }

    #[test]
    fn test_drop_in_output_zone_creates_output() {
        let mut canvas = Canvas::default();
        let s = canvas.add_shape(Shape::structured_input("s", Cdt(4), Point::new(100.0, 300.0)));
        let zone_centre = canvas.output_zone().centre();

        let first = canvas.start_connector(MagnetRef::output(s, 0)).unwrap();
        let DropOutcome::CreatedOutput(o1) = canvas.drop_connector(first, zone_centre).unwrap() else {
            panic!("expected a new output");
        };
        let second = canvas.start_connector(MagnetRef::output(s, 0)).unwrap();
        let DropOutcome::CreatedOutput(o2) = canvas.drop_connector(second, zone_centre).unwrap() else {
            panic!("expected a new output");
        };

        let g = canvas.graph();
        assert_eq!(g.shape(o1).unwrap().label, "output_1");
        assert_eq!(g.shape(o2).unwrap().label, "output_2");
        assert_eq!(g.shape(o1).unwrap().in_magnets()[0].cdt, Some(Cdt(4)));
        assert!(!overlaps(g.shape(o1).unwrap(), canvas.output_zone()));
    }

    #[test]
    fn test_drop_elsewhere_discards() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::raw_input("a", Point::new(100.0, 300.0)));
        let cable = canvas.start_connector(MagnetRef::output(a, 0)).unwrap();
        let outcome = canvas.drop_connector(cable, Point::new(400.0, 500.0)).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded);
        assert!(canvas.graph().connector(cable).is_none());
        assert!(!canvas.graph().shape(a).unwrap().out_magnets()[0].is_connected());
    }

    #[test]
    fn test_hit_testing() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::raw_input("a", Point::new(100.0, 300.0)));
        let m = canvas.add_shape(step("m", 1, Point::new(400.0, 200.0)));
        let cable = canvas.start_connector(MagnetRef::output(a, 0)).unwrap();
        let target = canvas.graph().magnet_position(MagnetRef::input(m, 0)).unwrap();
        canvas.drop_connector(cable, target).unwrap();

        assert_eq!(canvas.shape_at(Point::new(400.0, 200.0)), Some(m));
        assert_eq!(canvas.shape_at(Point::new(250.0, 550.0)), None);
        assert_eq!(canvas.magnet_at(target), Some(MagnetRef::input(m, 0)));

        let mid = canvas.connector_midpoint(cable).unwrap();
        assert_eq!(canvas.connector_at(mid), Some(cable));
        assert_eq!(canvas.connector_at(Point::new(250.0, 550.0)), None);
    }

    #[test]
    fn test_ambiguous_order_follows_drags() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::raw_input("a", Point::new(100.0, 300.0)));
        let upper = canvas.add_shape(step("upper", 1, Point::new(300.0, 150.0)));
        let lower = canvas.add_shape(step("lower", 1, Point::new(300.0, 450.0)));
        for m in [upper, lower] {
            let cable = canvas.start_connector(MagnetRef::output(a, 0)).unwrap();
            let target = canvas.graph().magnet_position(MagnetRef::input(m, 0)).unwrap();
            canvas.drop_connector(cable, target).unwrap();
        }
        assert!(canvas.is_exec_order_ambiguous());
        assert_eq!(canvas.exec_order().unwrap().flatten(), vec![upper, lower]);

        canvas.move_shape(upper, 0.0, 400.0).unwrap();
        canvas.finish_drag();
        assert_eq!(canvas.exec_order().unwrap().flatten(), vec![lower, upper]);
    }

    /// Input `i` feeding sibling steps `a` and `b`, with `a` first in
    /// reading order, plus a loose input `r` parked above `a`
    fn siblings() -> (Canvas, ShapeId, ShapeId, ShapeId) {
        let mut canvas = Canvas::default();
        let i = canvas.add_shape(Shape::raw_input("i", Point::new(80.0, 400.0)));
        let a = canvas.add_shape(step("a", 1, Point::new(300.0, 200.0)));
        let b = canvas.add_shape(step("b", 1, Point::new(200.0, 260.0)));
        for m in [a, b] {
            let cable = canvas.start_connector(MagnetRef::output(i, 0)).unwrap();
            let target = canvas.graph().magnet_position(MagnetRef::input(m, 0)).unwrap();
            canvas.drop_connector(cable, target).unwrap();
        }
        let r = canvas.add_shape(Shape::raw_input("r", Point::new(300.0, 120.0)));
        assert_eq!(canvas.exec_order().unwrap().flatten(), vec![a, b]);
        (canvas, a, b, r)
    }

    #[test]
    fn test_dragging_an_input_into_a_step_resorts_its_phase() {
        let (mut canvas, a, b, r) = siblings();

        let report = canvas.move_shape(r, 0.0, 70.0).unwrap();
        assert!(report.displaced.contains(&a));
        assert!(canvas.graph().shape(a).unwrap().dy > 0.0);

        let fresh = PhaseOrder::compute(canvas.graph()).unwrap();
        assert_eq!(fresh.flatten(), vec![b, a]);
        assert_eq!(canvas.exec_order().unwrap().flatten(), vec![b, a]);
    }

    #[test]
    fn test_adding_an_input_onto_a_step_resorts_its_phase() {
        let (mut canvas, a, b, _) = siblings();

        canvas.add_shape(Shape::raw_input("late", Point::new(300.0, 190.0)));
        assert!(canvas.graph().shape(a).unwrap().y > 200.0);
        assert_eq!(canvas.exec_order().unwrap().flatten(), vec![b, a]);
    }

    #[test]
    fn test_delete_refreshes_order() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::raw_input("a", Point::new(100.0, 300.0)));
        let m = canvas.add_shape(step("m", 1, Point::new(300.0, 300.0)));
        let cable = canvas.start_connector(MagnetRef::output(a, 0)).unwrap();
        let target = canvas.graph().magnet_position(MagnetRef::input(m, 0)).unwrap();
        canvas.drop_connector(cable, target).unwrap();
        assert!(canvas.exec_order().is_some());

        canvas.delete(ObjectRef::Connector(cable)).unwrap();
        assert!(canvas.exec_order().is_none());
        canvas.delete(ObjectRef::Shape(m)).unwrap();
        assert!(canvas.exec_order().unwrap().is_empty());
    }
}
