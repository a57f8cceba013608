//! Producing a pipeline description from the canvas

use std::collections::HashMap;

use tracing::info;

use crate::canvas::Canvas;
use crate::geometry::IsometricTransform;
use crate::graph::{Graph, GraphError, Magnet, ShapeId, ShapeKind};
use crate::layout::PhaseOrder;

use super::description::{
    CableDescription, InputDescription, OutcableDescription, PipelineDescription, PortDescription,
    StepDescription,
};

/// Describe the pipeline on `canvas`.
///
/// The graph must pass its integrity check. Inputs and outputs are numbered in
/// reading order, steps in execution order.
pub fn describe(canvas: &Canvas) -> Result<PipelineDescription, GraphError> {
    let graph = canvas.graph();
    graph.assert_integrity()?;

    let config = canvas.config();
    let fraction = |shape_id: ShapeId| {
        graph
            .shape(shape_id)
            .map(|s| {
                let c = s.centre();
                (c.x / config.width, c.y / config.height)
            })
            .unwrap_or_default()
    };

    let exec_order = match canvas.exec_order() {
        Some(order) => order.flatten(),
        None => PhaseOrder::compute(graph)
            .map(|order| order.flatten())
            .unwrap_or_else(|_| graph.methods().to_vec()),
    };
    let step_num: HashMap<ShapeId, usize> = exec_order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i + 1))
        .collect();

    let inputs = reading_order(graph, graph.inputs())
        .into_iter()
        .enumerate()
        .filter_map(|(i, id)| {
            let shape = graph.shape(id)?;
            let (x, y) = fraction(id);
            Some(InputDescription {
                dataset_name: shape.label.clone(),
                dataset_idx: i + 1,
                x,
                y,
                compounddatatype: match shape.kind {
                    ShapeKind::StructuredInput { cdt } => Some(cdt.0),
                    _ => None,
                },
            })
        })
        .collect();

    let steps = exec_order
        .iter()
        .filter_map(|&id| {
            let shape = graph.shape(id)?;
            let (x, y) = fraction(id);
            let cables_in = shape
                .in_magnets()
                .iter()
                .filter_map(|magnet| {
                    let (source_step, source_dataset_name) = source_of(graph, magnet, &step_num)?;
                    Some(CableDescription {
                        source_step,
                        source_dataset_name,
                        dest_dataset_name: magnet.label.clone(),
                    })
                })
                .collect();
            Some(StepDescription {
                name: shape.label.clone(),
                step_num: step_num.get(&id).copied().unwrap_or_default(),
                x,
                y,
                inputs: port_descriptions(shape.in_magnets()),
                outputs: port_descriptions(shape.out_magnets()),
                cables_in,
            })
        })
        .collect();

    let outcables = reading_order(graph, graph.outputs())
        .into_iter()
        .enumerate()
        .filter_map(|(i, id)| {
            let shape = graph.shape(id)?;
            let magnet = shape.in_magnets().first()?;
            let (source_step, source_dataset_name) = source_of(graph, magnet, &step_num)?;
            let (x, y) = fraction(id);
            Some(OutcableDescription {
                output_name: shape.label.clone(),
                output_idx: i + 1,
                source_step,
                source_dataset_name,
                x,
                y,
                output_cdt: magnet.cdt.map(|c| c.0),
            })
        })
        .collect();

    let description = PipelineDescription {
        inputs,
        steps,
        outcables,
    };
    info!(
        inputs = description.inputs.len(),
        steps = description.steps.len(),
        outputs = description.outcables.len(),
        "serialized pipeline"
    );
    Ok(description)
}

fn reading_order(graph: &Graph, ids: &[ShapeId]) -> Vec<ShapeId> {
    let mut sorted = ids.to_vec();
    sorted.sort_by(|&a, &b| match (graph.shape(a), graph.shape(b)) {
        (Some(a), Some(b)) => IsometricTransform::reading_order(a.centre(), b.centre()),
        _ => std::cmp::Ordering::Equal,
    });
    sorted
}

fn port_descriptions(magnets: &[Magnet]) -> Vec<PortDescription> {
    magnets
        .iter()
        .enumerate()
        .map(|(i, m)| PortDescription {
            dataset_name: m.label.clone(),
            dataset_idx: i + 1,
            compounddatatype: m.cdt.map(|c| c.0),
        })
        .collect()
}

/// Step number and magnet label feeding an input magnet; step 0 is a
/// pipeline input, named by its own label.
fn source_of(graph: &Graph, magnet: &Magnet, step_num: &HashMap<ShapeId, usize>) -> Option<(usize, String)> {
    let connector = graph.connector(*magnet.connectors().first()?)?;
    let source = connector.source();
    let shape = graph.shape(source.shape)?;
    if shape.is_input() {
        return Some((0, shape.label.clone()));
    }
    let label = graph.magnet(source)?.label.clone();
    Some((*step_num.get(&source.shape)?, label))
}
