//! Pipeline Canvas - the editing core of a visual pipeline builder
//!
//! Pipelines are drawn as inputs, steps and outputs joined by cables. This
//! library keeps that graph consistent while shapes are dragged around,
//! works out the order steps run in, lays pipelines out automatically and
//! hit-tests the Bezier cables. Drawing and input handling are left to the
//! caller.
//!
//! # Example
//!
//! ```rust
//! use pipeline_canvas::{load, serialize, CanvasConfig};
//!
//! let json = r#"{
//!     "inputs": [{"dataset_name": "reads", "dataset_idx": 1, "x": 0.1, "y": 0.5}],
//!     "steps": [{
//!         "name": "trim", "step_num": 1, "x": 0.5, "y": 0.5,
//!         "inputs": [{"dataset_name": "raw", "dataset_idx": 1}],
//!         "outputs": [{"dataset_name": "trimmed", "dataset_idx": 1}],
//!         "cables_in": [{"source_step": 0, "source_dataset_name": "reads", "dest_dataset_name": "raw"}]
//!     }],
//!     "outcables": [{
//!         "output_name": "clean", "output_idx": 1, "source_step": 1,
//!         "source_dataset_name": "trimmed", "x": 0.5, "y": 0.9
//!     }]
//! }"#;
//!
//! let canvas = load(json, CanvasConfig::default()).unwrap();
//! assert!(!canvas.is_exec_order_ambiguous());
//! assert!(serialize(&canvas).unwrap().contains("\"trim\""));
//! ```

pub mod bezier;
pub mod canvas;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod pipeline;

pub use canvas::{Canvas, DropOutcome};
pub use error::LoadError;
pub use geometry::{BoundingBox, IsometricTransform, Point};
pub use graph::{Graph, GraphError, MagnetRef, ObjectRef, Shape, ShapeId};
pub use layout::{CanvasConfig, LayoutError, PhaseOrder};
pub use pipeline::PipelineDescription;

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur while writing a canvas back out
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The pipeline is not complete enough to submit
    #[error("pipeline is not submittable: {0}")]
    Integrity(#[from] GraphError),

    #[error("failed to encode pipeline: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a pipeline description from `path`, or from stdin when there is none
pub fn read_source(path: Option<&Path>) -> Result<String, LoadError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Load a JSON pipeline description onto a new canvas
pub fn load(source: &str, config: CanvasConfig) -> Result<Canvas, LoadError> {
    let description = PipelineDescription::from_json(source)?;
    Ok(pipeline::load_canvas(&description, config)?)
}

/// Describe the canvas as pretty-printed JSON
pub fn serialize(canvas: &Canvas) -> Result<String, SerializeError> {
    let description = pipeline::describe(canvas)?;
    Ok(description.to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_bad_json() {
        let err = load("{ not json", CanvasConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_load_rejects_dangling_cable() {
        let json = r#"{
            "inputs": [],
            "steps": [{
                "name": "s", "step_num": 1, "x": 0.5, "y": 0.5,
                "inputs": [{"dataset_name": "in", "dataset_idx": 1}],
                "cables_in": [{"source_step": 0, "source_dataset_name": "nowhere", "dest_dataset_name": "in"}]
            }]
        }"#;
        let err = load(json, CanvasConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Graph(GraphError::MissingShape { .. })));
    }

    #[test]
    fn test_read_source_reports_missing_file() {
        let err = read_source(Some(Path::new("does/not/exist.json"))).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
        assert!(err.to_string().starts_with("failed to read pipeline"));
    }

    #[test]
    fn test_serialize_incomplete_canvas() {
        let canvas = Canvas::default();
        assert!(matches!(
            serialize(&canvas),
            Err(SerializeError::Integrity(GraphError::EmptyPipeline))
        ));
    }
}
