//! Building a graph from a pipeline description

use tracing::info;

use crate::geometry::Point;
use crate::graph::{Cdt, Graph, GraphError, MagnetRef, MagnetSide, Port, Shape, ShapeId};
use crate::layout::CanvasConfig;

use super::description::{PipelineDescription, PortDescription};

/// Construct the graph a description denotes.
///
/// Every cable must name exactly one step and magnet; the first reference that
/// is missing or ambiguous aborts the load.
pub fn build_graph(description: &PipelineDescription, config: &CanvasConfig) -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    let at = |x: f64, y: f64| Point::new(x * config.width, y * config.height);

    let mut inputs: Vec<_> = description.inputs.iter().collect();
    inputs.sort_by_key(|i| i.dataset_idx);
    let input_ids: Vec<(String, ShapeId)> = inputs
        .into_iter()
        .map(|input| {
            let centre = at(input.x, input.y);
            let shape = match input.compounddatatype {
                Some(cdt) => Shape::structured_input(&input.dataset_name, Cdt(cdt), centre),
                None => Shape::raw_input(&input.dataset_name, centre),
            };
            (input.dataset_name.clone(), graph.add_shape(shape))
        })
        .collect();

    let mut steps: Vec<_> = description.steps.iter().collect();
    steps.sort_by_key(|s| s.step_num);
    let mut step_ids: Vec<(usize, ShapeId)> = Vec::with_capacity(steps.len());
    for step in &steps {
        let shape = Shape::method(
            &step.name,
            ports(&step.inputs),
            ports(&step.outputs),
            at(step.x, step.y),
        );
        step_ids.push((step.step_num, graph.add_shape(shape)));
    }

    let find_step = |step_num: usize| -> Result<ShapeId, GraphError> {
        step_ids
            .iter()
            .find(|(n, _)| *n == step_num)
            .map(|&(_, id)| id)
            .ok_or_else(|| GraphError::missing_shape(format!("step {}", step_num)))
    };
    let source_magnet = |graph: &Graph, step: usize, name: &str| -> Result<MagnetRef, GraphError> {
        if step == 0 {
            let matches: Vec<ShapeId> = input_ids
                .iter()
                .filter(|(label, _)| label == name)
                .map(|&(_, id)| id)
                .collect();
            return match matches.as_slice() {
                [id] => Ok(MagnetRef::output(*id, 0)),
                [] => Err(GraphError::missing_shape(name)),
                _ => Err(GraphError::duplicate_label(name, matches.len())),
            };
        }
        magnet_by_label(graph, find_step(step)?, MagnetSide::Output, name)
    };

    for step in &steps {
        let dest_shape = find_step(step.step_num)?;
        for cable in &step.cables_in {
            let source = source_magnet(&graph, cable.source_step, &cable.source_dataset_name)?;
            let dest = magnet_by_label(&graph, dest_shape, MagnetSide::Input, &cable.dest_dataset_name)?;
            graph.connect(source, dest)?;
        }
    }

    let mut outcables: Vec<_> = description.outcables.iter().collect();
    outcables.sort_by_key(|o| o.output_idx);
    for outcable in outcables {
        let source = source_magnet(&graph, outcable.source_step, &outcable.source_dataset_name)?;
        let output = graph.add_shape(Shape::output(
            &outcable.output_name,
            outcable.output_cdt.map(Cdt),
            at(outcable.x, outcable.y),
        ));
        graph.connect(source, MagnetRef::input(output, 0))?;
    }

    info!(
        inputs = graph.inputs().len(),
        steps = graph.methods().len(),
        outputs = graph.outputs().len(),
        "loaded pipeline"
    );
    Ok(graph)
}

fn ports(descriptions: &[PortDescription]) -> Vec<Port> {
    let mut sorted: Vec<_> = descriptions.iter().collect();
    sorted.sort_by_key(|p| p.dataset_idx);
    sorted
        .into_iter()
        .map(|p| Port {
            label: p.dataset_name.clone(),
            cdt: p.compounddatatype.map(Cdt),
        })
        .collect()
}

fn magnet_by_label(graph: &Graph, shape: ShapeId, side: MagnetSide, label: &str) -> Result<MagnetRef, GraphError> {
    let owner = graph.shape(shape).ok_or(GraphError::UnknownShape(shape))?;
    let matches: Vec<usize> = owner
        .magnets(side)
        .iter()
        .enumerate()
        .filter(|(_, m)| m.label == label)
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [index] => Ok(MagnetRef {
            shape,
            side,
            index: *index,
        }),
        [] => Err(GraphError::missing_magnet(&owner.label, label)),
        _ => Err(GraphError::duplicate_label(format!("{}.{}", owner.label, label), matches.len())),
    }
}
