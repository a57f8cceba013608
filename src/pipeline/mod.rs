//! Loading a canvas from a pipeline description and describing it again

pub mod description;
pub mod load;
pub mod serialize;

pub use description::{
    CableDescription, InputDescription, OutcableDescription, PipelineDescription, PortDescription,
    StepDescription,
};
pub use load::build_graph;
pub use serialize::describe;

use crate::canvas::Canvas;
use crate::graph::GraphError;
use crate::layout::CanvasConfig;

/// Build a canvas holding the pipeline `description` denotes
pub fn load_canvas(description: &PipelineDescription, config: CanvasConfig) -> Result<Canvas, GraphError> {
    let graph = build_graph(description, &config)?;
    Ok(Canvas::from_graph(graph, config))
}
