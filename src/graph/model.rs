//! The graph arena and its mutation entry points

use std::collections::HashSet;

use tracing::debug;

use crate::bezier::CubicCurve;
use crate::geometry::Point;

use super::connector::{cable_curve, Connector};
use super::error::GraphError;
use super::id::{ConnectorId, MagnetRef, MagnetSide, ObjectRef, ShapeId};
use super::shape::{Magnet, Shape, ShapeKind};

/// Result of swapping one step for another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Id of the replacement step
    pub shape: ShapeId,
    /// Whether "every magnet connected" differs between the old and new step
    pub status_changed: bool,
}

/// Owns every shape and connector of one pipeline.
///
/// The master shape list and the input/step/output subsets are only ever
/// changed together, so they always agree.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    shapes: Vec<Option<Shape>>,
    connectors: Vec<Option<Connector>>,
    shape_order: Vec<ShapeId>,
    inputs: Vec<ShapeId>,
    methods: Vec<ShapeId>,
    outputs: Vec<ShapeId>,
    connector_order: Vec<ConnectorId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================================================================
    // Lookup
    // ==================================================================

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn require(&self, id: ShapeId) -> Result<&Shape, GraphError> {
        self.shape(id).ok_or(GraphError::UnknownShape(id))
    }

    /// All shapes in insertion order
    pub fn shape_ids(&self) -> &[ShapeId] {
        &self.shape_order
    }

    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        self.shape_order
            .iter()
            .filter_map(|&id| self.shape(id).map(|s| (id, s)))
    }

    pub fn inputs(&self) -> &[ShapeId] {
        &self.inputs
    }

    pub fn methods(&self) -> &[ShapeId] {
        &self.methods
    }

    pub fn outputs(&self) -> &[ShapeId] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.shape_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape_order.is_empty()
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id.index()).and_then(Option::as_ref)
    }

    pub fn connector_ids(&self) -> &[ConnectorId] {
        &self.connector_order
    }

    pub fn connectors(&self) -> impl Iterator<Item = (ConnectorId, &Connector)> {
        self.connector_order
            .iter()
            .filter_map(|&id| self.connector(id).map(|c| (id, c)))
    }

    pub fn magnet(&self, magnet: MagnetRef) -> Option<&Magnet> {
        self.shape(magnet.shape)?
            .magnets(magnet.side)
            .get(magnet.index)
    }

    fn magnet_mut(&mut self, magnet: MagnetRef) -> Option<&mut Magnet> {
        self.shape_mut(magnet.shape)?
            .magnets_mut(magnet.side)
            .get_mut(magnet.index)
    }

    pub fn magnet_position(&self, magnet: MagnetRef) -> Option<Point> {
        let shape = self.shape(magnet.shape)?;
        let m = shape.magnets(magnet.side).get(magnet.index)?;
        Some(shape.magnet_position(m))
    }

    /// Look a shape up by label. More than one match is an error.
    pub fn find_by_label(&self, label: &str) -> Result<Option<ShapeId>, GraphError> {
        let matches: Vec<ShapeId> = self
            .shapes()
            .filter(|(_, s)| s.label == label)
            .map(|(id, _)| id)
            .collect();
        match matches.as_slice() {
            [] => Ok(None),
            [id] => Ok(Some(*id)),
            _ => Err(GraphError::DuplicateLabel {
                label: label.to_string(),
                count: matches.len(),
            }),
        }
    }

    // ==================================================================
    // Shapes
    // ==================================================================

    fn subset_mut(&mut self, kind: &ShapeKind) -> Option<&mut Vec<ShapeId>> {
        match kind {
            ShapeKind::RawInput | ShapeKind::StructuredInput { .. } => Some(&mut self.inputs),
            ShapeKind::Method => Some(&mut self.methods),
            ShapeKind::Output { .. } => Some(&mut self.outputs),
            ShapeKind::OutputZone { .. } => None,
        }
    }

    fn push_slot(&mut self, mut shape: Shape) -> ShapeId {
        for magnet in shape.in_magnets.iter_mut().chain(shape.out_magnets.iter_mut()) {
            magnet.connected.clear();
        }
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(Some(shape));
        id
    }

    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let kind = shape.kind.clone();
        let id = self.push_slot(shape);
        self.shape_order.push(id);
        if let Some(subset) = self.subset_mut(&kind) {
            subset.push(id);
        }
        debug!(?id, ?kind, "added shape");
        id
    }

    fn remove_shape_entry(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.get_mut(id.index())?.take()?;
        self.shape_order.retain(|&s| s != id);
        if let Some(subset) = self.subset_mut(&shape.kind) {
            subset.retain(|&s| s != id);
        }
        Some(shape)
    }

    /// Delete a shape together with every cable touching it.
    ///
    /// Output nodes left without their only inbound cable are deleted too.
    pub fn delete_shape(&mut self, id: ShapeId) -> Result<(), GraphError> {
        let shape = self.require(id)?;
        let attached: Vec<ConnectorId> = shape
            .in_magnets
            .iter()
            .chain(&shape.out_magnets)
            .flat_map(|m| m.connected.iter().copied())
            .collect();

        for connector in attached {
            if self.connector(connector).is_some() {
                self.delete_connector(connector)?;
            }
        }
        if let Some(shape) = self.remove_shape_entry(id) {
            debug!(?id, label = %shape.label, "deleted shape");
        }
        Ok(())
    }

    pub fn delete_object(&mut self, object: ObjectRef) -> Result<(), GraphError> {
        match object {
            ObjectRef::Shape(id) => self.delete_shape(id),
            ObjectRef::Connector(id) => self.delete_connector(id),
        }
    }

    /// Move a shape's resting position, leaving its transient offset alone
    pub fn set_position(&mut self, id: ShapeId, centre: Point) -> Result<(), GraphError> {
        let shape = self.shape_mut(id).ok_or(GraphError::UnknownShape(id))?;
        shape.x = centre.x;
        shape.y = centre.y;
        self.invalidate_curves_of(id);
        Ok(())
    }

    /// Add to a shape's transient offset
    pub fn translate(&mut self, id: ShapeId, dx: f64, dy: f64) -> Result<(), GraphError> {
        let shape = self.shape_mut(id).ok_or(GraphError::UnknownShape(id))?;
        shape.dx += dx;
        shape.dy += dy;
        self.invalidate_curves_of(id);
        Ok(())
    }

    /// Fold every shape's transient offset into its resting position
    pub fn fold_offsets(&mut self) {
        for shape in self.shapes.iter_mut().flatten() {
            shape.fold_offset();
        }
    }

    pub(crate) fn invalidate_curves_of(&self, id: ShapeId) {
        let Some(shape) = self.shape(id) else {
            return;
        };
        for magnet in shape.in_magnets.iter().chain(&shape.out_magnets) {
            for &c in &magnet.connected {
                if let Some(connector) = self.connector(c) {
                    connector.invalidate();
                }
            }
        }
    }

    pub fn is_fully_connected(&self, id: ShapeId) -> bool {
        self.shape(id).is_some_and(Shape::is_fully_connected)
    }

    /// Swap step `old` for `replacement`, keeping `old`'s position.
    ///
    /// Each cable is carried over to the magnet at the same index on the same
    /// side when the datatypes agree exactly; other cables are deleted.
    pub fn replace_method(
        &mut self,
        old: ShapeId,
        mut replacement: Shape,
    ) -> Result<ReplaceOutcome, GraphError> {
        let previous = self.require(old)?;
        if !previous.is_method() {
            return Err(GraphError::NotAMethod {
                label: previous.label.clone(),
            });
        }
        if !replacement.is_method() {
            return Err(GraphError::NotAMethod {
                label: replacement.label,
            });
        }

        replacement.x = previous.x;
        replacement.y = previous.y;
        replacement.dx = previous.dx;
        replacement.dy = previous.dy;
        let was_complete = previous.is_fully_connected();

        let plan = |old_magnets: &[Magnet], new_magnets: &[Magnet]| -> Vec<(ConnectorId, Option<usize>)> {
            old_magnets
                .iter()
                .enumerate()
                .flat_map(|(i, magnet)| {
                    let target = new_magnets
                        .get(i)
                        .filter(|m| m.cdt == magnet.cdt)
                        .map(|_| i);
                    magnet.connected.iter().map(move |&c| (c, target))
                })
                .collect()
        };
        let input_plan = plan(&previous.in_magnets, &replacement.in_magnets);
        let output_plan = plan(&previous.out_magnets, &replacement.out_magnets);

        let new_id = self.push_slot(replacement);

        for (connector, target) in input_plan {
            match target {
                Some(index) => {
                    let conn = self.detach(connector)?;
                    self.connect_unchecked(conn.source(), MagnetRef::input(new_id, index));
                }
                None => self.delete_connector(connector)?,
            }
        }
        for (connector, target) in output_plan {
            let dest = self.connector(connector).and_then(Connector::dest);
            match (target, dest) {
                (Some(index), Some(dest)) => {
                    self.detach(connector)?;
                    self.connect_unchecked(MagnetRef::output(new_id, index), dest);
                }
                _ => self.delete_connector(connector)?,
            }
        }

        self.shapes[old.index()] = None;
        for id in self.shape_order.iter_mut().chain(self.methods.iter_mut()) {
            if *id == old {
                *id = new_id;
            }
        }

        let is_complete = self.is_fully_connected(new_id);
        debug!(?old, ?new_id, was_complete, is_complete, "replaced step");
        Ok(ReplaceOutcome {
            shape: new_id,
            status_changed: was_complete != is_complete,
        })
    }

    // ==================================================================
    // Connectors
    // ==================================================================

    fn push_connector(&mut self, connector: Connector) -> ConnectorId {
        let id = ConnectorId(self.connectors.len() as u32);
        self.connectors.push(Some(connector));
        self.connector_order.push(id);
        id
    }

    fn connect_unchecked(&mut self, source: MagnetRef, dest: MagnetRef) -> ConnectorId {
        let end = self.magnet_position(dest).unwrap_or_default();
        let id = self.push_connector(Connector::new(source, Some(dest), end));
        for magnet in [source, dest] {
            if let Some(m) = self.magnet_mut(magnet) {
                m.connected.push(id);
            }
        }
        id
    }

    fn check_connectable(&self, source: MagnetRef, dest: MagnetRef) -> Result<(), GraphError> {
        if source.side != MagnetSide::Output || dest.side != MagnetSide::Input {
            return Err(GraphError::WrongDirection);
        }
        let from = self
            .magnet(source)
            .ok_or(GraphError::UnknownMagnet(source))?;
        let to = self.magnet(dest).ok_or(GraphError::UnknownMagnet(dest))?;
        if to.is_connected() {
            return Err(GraphError::InputMagnetOccupied {
                magnet: to.label.clone(),
            });
        }
        if !from.accepts(to) {
            return Err(GraphError::IncompatibleMagnets {
                source_magnet: from.label.clone(),
                dest_magnet: to.label.clone(),
            });
        }
        if source.shape == dest.shape || self.reaches(dest.shape, source.shape) {
            return Err(GraphError::WouldCreateCycle {
                source_shape: self.require(source.shape)?.label.clone(),
                dest_shape: self.require(dest.shape)?.label.clone(),
            });
        }
        Ok(())
    }

    /// Whether `to` can be reached from `from` by following cables forward
    fn reaches(&self, from: ShapeId, to: ShapeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if seen.insert(current) {
                stack.extend(self.connected_outputs(current));
            }
        }
        false
    }

    /// Attach a new cable between an output and an input magnet
    pub fn connect(&mut self, source: MagnetRef, dest: MagnetRef) -> Result<ConnectorId, GraphError> {
        self.check_connectable(source, dest)?;
        Ok(self.connect_unchecked(source, dest))
    }

    /// Start a loose cable from an output magnet; its far end follows
    /// [`Graph::set_connector_end`] until it is attached or deleted.
    pub fn start_connector(&mut self, source: MagnetRef) -> Result<ConnectorId, GraphError> {
        if source.side != MagnetSide::Output {
            return Err(GraphError::WrongDirection);
        }
        let start = self
            .magnet_position(source)
            .ok_or(GraphError::UnknownMagnet(source))?;
        let id = self.push_connector(Connector::new(source, None, start));
        if let Some(m) = self.magnet_mut(source) {
            m.connected.push(id);
        }
        Ok(id)
    }

    /// Move the loose end of an unattached cable
    pub fn set_connector_end(&mut self, id: ConnectorId, point: Point) -> Result<(), GraphError> {
        let connector = self
            .connectors
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownConnector(id))?;
        connector.free_end = point;
        connector.invalidate();
        Ok(())
    }

    /// Land a loose cable on an input magnet
    pub fn attach_connector(&mut self, id: ConnectorId, dest: MagnetRef) -> Result<(), GraphError> {
        let connector = self.connector(id).ok_or(GraphError::UnknownConnector(id))?;
        if connector.is_attached() {
            return Err(GraphError::AlreadyAttached(id));
        }
        self.check_connectable(connector.source(), dest)?;

        let end = self.magnet_position(dest).unwrap_or_default();
        if let Some(connector) = self.connectors.get_mut(id.index()).and_then(Option::as_mut) {
            connector.dest = Some(dest);
            connector.free_end = end;
            connector.invalidate();
        }
        if let Some(m) = self.magnet_mut(dest) {
            m.connected.push(id);
        }
        Ok(())
    }

    /// Unhook a cable from both magnets without any cascade
    fn detach(&mut self, id: ConnectorId) -> Result<Connector, GraphError> {
        let connector = self
            .connectors
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(GraphError::UnknownConnector(id))?;
        self.connector_order.retain(|&c| c != id);
        let ends = std::iter::once(connector.source()).chain(connector.dest());
        for end in ends {
            if let Some(m) = self.magnet_mut(end) {
                m.connected.retain(|&c| c != id);
            }
        }
        Ok(connector)
    }

    /// Delete a cable. An output node left with no inbound cable goes too.
    pub fn delete_connector(&mut self, id: ConnectorId) -> Result<(), GraphError> {
        let connector = self.detach(id)?;
        if let Some(dest) = connector.dest() {
            let orphaned = self
                .shape(dest.shape)
                .is_some_and(|s| s.is_output() && !s.in_magnets.iter().any(Magnet::is_connected));
            if orphaned {
                if let Some(shape) = self.remove_shape_entry(dest.shape) {
                    debug!(label = %shape.label, "removed orphaned output");
                }
            }
        }
        Ok(())
    }

    /// Control points of a cable, computed on first use after a move
    pub fn connector_curve(&self, id: ConnectorId) -> Option<CubicCurve> {
        let connector = self.connector(id)?;
        if let Some(curve) = connector.cached_curve() {
            return Some(curve);
        }
        let from = self.magnet_position(connector.source())?;
        let to = match connector.dest() {
            Some(dest) => self.magnet_position(dest)?,
            None => connector.free_end(),
        };
        let curve = cable_curve(from, to);
        connector.cache_curve(curve);
        Some(curve)
    }

    // ==================================================================
    // Traversal
    // ==================================================================

    /// Shapes one cable downstream of `id`
    pub fn connected_outputs(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut found = Vec::new();
        let Some(shape) = self.shape(id) else {
            return found;
        };
        for magnet in &shape.out_magnets {
            for &c in &magnet.connected {
                let dest = self.connector(c).and_then(Connector::dest);
                if let Some(dest) = dest {
                    if !found.contains(&dest.shape) {
                        found.push(dest.shape);
                    }
                }
            }
        }
        found
    }

    /// Pipeline inputs one cable upstream of `id`
    pub fn connected_input_nodes_of(&self, id: ShapeId) -> Vec<ShapeId> {
        let mut found = Vec::new();
        for source in self.input_sources(id).into_iter().flatten() {
            let is_input = self.shape(source).is_some_and(Shape::is_input);
            if is_input && !found.contains(&source) {
                found.push(source);
            }
        }
        found
    }

    /// For each input magnet of `id`, the shape feeding it, if any
    pub fn input_sources(&self, id: ShapeId) -> Vec<Option<ShapeId>> {
        let Some(shape) = self.shape(id) else {
            return Vec::new();
        };
        shape
            .in_magnets
            .iter()
            .map(|magnet| {
                magnet
                    .connected
                    .iter()
                    .filter_map(|&c| self.connector(c))
                    .map(|c| c.source().shape)
                    .next()
            })
            .collect()
    }
}
