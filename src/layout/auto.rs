//! Automatic layered layout
//!
//! Shapes are grouped into visual layers that follow the phase order: the
//! inputs of the first phase, then each phase's steps together with the
//! outputs fed by the phase before. Layers run along the isometric depth axis
//! and spread along the isometric x axis, each one centred under the magnets
//! that feed it. The result is fitted to the canvas and handed to the
//! collision resolver for cleanup.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use crate::geometry::{BoundingBox, IsometricTransform, Point};
use crate::graph::{Graph, Shape, ShapeId};

use super::collision::CollisionResolver;
use super::config::CanvasConfig;
use super::error::LayoutError;
use super::phase::PhaseOrder;

/// Holds steps that turned up before an earlier step of the same phase.
///
/// A step only joins its layer once every step listed before it in the phase
/// has joined; anything arriving early waits here and is flushed as soon as
/// the gap closes.
#[derive(Debug)]
struct DeferredQueue<'a> {
    phase: &'a [ShapeId],
    next: usize,
    waiting: VecDeque<ShapeId>,
}

impl<'a> DeferredQueue<'a> {
    fn new(phase: &'a [ShapeId]) -> Self {
        Self {
            phase,
            next: 0,
            waiting: VecDeque::new(),
        }
    }

    fn offer(&mut self, id: ShapeId, layer: &mut Vec<ShapeId>) {
        if self.phase.get(self.next) == Some(&id) {
            layer.push(id);
            self.next += 1;
            self.flush(layer);
        } else if !self.waiting.contains(&id) {
            self.waiting.push_back(id);
        }
    }

    fn flush(&mut self, layer: &mut Vec<ShapeId>) {
        while let Some(&expected) = self.phase.get(self.next) {
            let Some(pos) = self.waiting.iter().position(|&w| w == expected) else {
                break;
            };
            self.waiting.remove(pos);
            layer.push(expected);
            self.next += 1;
        }
    }

    /// Place the rest of the phase in order, whether or not a cable led here
    fn finish(mut self, layer: &mut Vec<ShapeId>) {
        self.flush(layer);
        layer.extend_from_slice(&self.phase[self.next.min(self.phase.len())..]);
    }
}

/// Group every shape of `graph` into visual layers, top layer first
pub fn visual_layers(graph: &Graph, order: &PhaseOrder) -> Vec<Vec<ShapeId>> {
    let mut placed: HashSet<ShapeId> = HashSet::new();
    let mut layers: Vec<Vec<ShapeId>> = Vec::new();
    let phases = order.layers();

    let mut first = Vec::new();
    for &method in phases.first().map(Vec::as_slice).unwrap_or_default() {
        for input in graph.connected_input_nodes_of(method) {
            if placed.insert(input) {
                first.push(input);
            }
        }
    }
    layers.push(first);

    if let Some(phase) = phases.first() {
        placed.extend(phase.iter().copied());
        layers.push(phase.clone());
    }

    for (k, phase) in phases.iter().enumerate() {
        let next_phase = phases.get(k + 1).map(Vec::as_slice).unwrap_or_default();
        let mut layer = Vec::new();
        let mut queue = DeferredQueue::new(next_phase);

        for &method in phase {
            for candidate in graph.connected_outputs(method) {
                if placed.contains(&candidate) {
                    continue;
                }
                let Some(shape) = graph.shape(candidate) else {
                    continue;
                };
                if shape.is_output() {
                    placed.insert(candidate);
                    layer.push(candidate);
                } else if next_phase.contains(&candidate) {
                    queue.offer(candidate, &mut layer);
                }
            }
        }
        queue.finish(&mut layer);
        placed.extend(next_phase.iter().copied());

        // Inputs first needed by the next phase sit one layer above it
        for &method in next_phase {
            for input in graph.connected_input_nodes_of(method) {
                if placed.insert(input) {
                    if let Some(previous) = layers.last_mut() {
                        previous.push(input);
                    }
                }
            }
        }

        debug!(layer = layers.len(), shapes = layer.len(), "built visual layer");
        layers.push(layer);
    }

    // Anything the cables never reached goes on top
    let loose: Vec<ShapeId> = graph
        .shape_ids()
        .iter()
        .copied()
        .filter(|id| !placed.contains(id))
        .collect();
    layers[0].extend(loose);

    layers.retain(|layer| !layer.is_empty());
    layers
}

/// Lay out every shape of `graph` from scratch.
///
/// Positions are only written once the whole layout has been computed, so an
/// error leaves the graph exactly as it was. Returns the visual layers used.
pub fn auto_layout(
    graph: &mut Graph,
    order: &PhaseOrder,
    config: &CanvasConfig,
    obstacle: Option<&Shape>,
) -> Result<Vec<Vec<ShapeId>>, LayoutError> {
    let layers = visual_layers(graph, order);
    let iso = place_layers(graph, &layers, config)?;
    let positions = fit_to_canvas(graph, &iso, config);

    graph.fold_offsets();
    for (&id, &centre) in &positions {
        if let Err(e) = graph.set_position(id, centre) {
            debug!(%e, "position skipped");
        }
    }

    let mut resolver = CollisionResolver::new(config);
    if let Some(obstacle) = obstacle {
        resolver = resolver.with_obstacle(obstacle);
    }
    let mut pushes = 0;
    for layer in &layers {
        for &id in layer {
            pushes += resolver.resolve(graph, id, config.relayout_bias).pushes;
        }
    }
    graph.fold_offsets();

    info!(layers = layers.len(), shapes = positions.len(), pushes, "auto-layout finished");
    Ok(layers)
}

/// Isometric centre of every shape, layer by layer
fn place_layers(
    graph: &Graph,
    layers: &[Vec<ShapeId>],
    config: &CanvasConfig,
) -> Result<HashMap<ShapeId, Point>, LayoutError> {
    let mut iso: HashMap<ShapeId, Point> = HashMap::new();

    for (index, layer) in layers.iter().enumerate() {
        let centre = if index == 0 {
            0.0
        } else {
            feeding_centroid(graph, layer, &iso)
        };
        if !centre.is_finite() {
            return Err(LayoutError::non_finite_centroid(index));
        }

        let depth = index as f64 * config.layer_spacing;
        let half_span = (layer.len() as f64 - 1.0) / 2.0;
        for (slot, &id) in layer.iter().enumerate() {
            let along = centre + (slot as f64 - half_span) * config.node_spacing;
            iso.insert(id, Point::new(along, depth));
        }
    }
    Ok(iso)
}

/// Mean isometric x of the already placed output magnets feeding `layer`
fn feeding_centroid(graph: &Graph, layer: &[ShapeId], iso: &HashMap<ShapeId, Point>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &id in layer {
        let Some(shape) = graph.shape(id) else {
            continue;
        };
        for magnet in shape.in_magnets() {
            let sources = magnet
                .connectors()
                .iter()
                .filter_map(|&c| graph.connector(c))
                .map(|c| c.source());
            for source in sources {
                let (Some(&centre), Some(m)) = (iso.get(&source.shape), graph.magnet(source)) else {
                    continue;
                };
                let position = IsometricTransform::to_cartesian(centre) + m.offset;
                sum += IsometricTransform::iso_x(position);
                count += 1;
            }
        }
    }
    sum / count as f64
}

/// Map isometric centres onto the canvas, scaled into the margins and centred
fn fit_to_canvas(
    graph: &Graph,
    iso: &HashMap<ShapeId, Point>,
    config: &CanvasConfig,
) -> HashMap<ShapeId, Point> {
    let cartesian: HashMap<ShapeId, Point> = iso
        .iter()
        .map(|(&id, &p)| (id, IsometricTransform::to_cartesian(p)))
        .collect();

    let extent = cartesian
        .iter()
        .filter_map(|(&id, &centre)| {
            let (w, h) = graph.shape(id)?.size();
            Some(BoundingBox::new(centre.x - w / 2.0, centre.y - h / 2.0, w, h))
        })
        .reduce(|a, b| a.union(&b));
    let Some(extent) = extent else {
        return cartesian;
    };

    let target = BoundingBox::new(
        config.margin,
        config.margin,
        config.width - 2.0 * config.margin,
        config.height - 2.0 * config.margin,
    );
    let ratio = |available: f64, used: f64| {
        if used > f64::EPSILON {
            available / used
        } else {
            f64::INFINITY
        }
    };
    let (mut sx, mut sy) = (
        ratio(target.width, extent.width),
        ratio(target.height, extent.height),
    );
    if config.preserve_aspect {
        let s = sx.min(sy);
        (sx, sy) = (s, s);
    }
    if !sx.is_finite() {
        sx = 1.0;
    }
    if !sy.is_finite() {
        sy = 1.0;
    }

    let from = extent.center();
    let to = target.center();
    cartesian
        .into_iter()
        .map(|(id, p)| {
            let scaled = Point::new(to.x + (p.x - from.x) * sx, to.y + (p.y - from.y) * sy);
            (id, scaled)
        })
        .collect()
}
