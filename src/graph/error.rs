//! Structural errors raised by graph mutation, lookup and validation

use thiserror::Error;

use super::id::{ConnectorId, MagnetRef, ShapeId};

/// Errors that make a requested graph operation impossible.
///
/// None of these leave the graph half-modified: every mutation validates
/// before it changes anything.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("pipeline is empty")]
    EmptyPipeline,

    #[error("pipeline has no inputs")]
    NoInputs,

    #[error("pipeline has no steps")]
    NoMethods,

    #[error("pipeline has no outputs")]
    NoOutputs,

    #[error(
        "shape count mismatch: {total} shapes but {inputs} inputs, {methods} steps and {outputs} outputs"
    )]
    ShapeCountMismatch {
        total: usize,
        inputs: usize,
        methods: usize,
        outputs: usize,
    },

    #[error("input '{label}' is not connected to anything")]
    DisconnectedInput { label: String },

    #[error("output '{label}' is not connected to anything")]
    DisconnectedOutput { label: String },

    #[error("step '{method}' has an unconnected magnet '{magnet}'")]
    UnconnectedMethodMagnet { method: String, magnet: String },

    #[error("label '{label}' is used {count} times")]
    DuplicateLabel { label: String, count: usize },

    #[error("no shape named '{name}'")]
    MissingShape { name: String },

    #[error("shape '{shape}' has no magnet '{magnet}'")]
    MissingMagnet { shape: String, magnet: String },

    #[error("shape {0} does not exist")]
    UnknownShape(ShapeId),

    #[error("connector {0} does not exist")]
    UnknownConnector(ConnectorId),

    #[error("connector {0} is already attached")]
    AlreadyAttached(ConnectorId),

    #[error("magnet {0:?} does not exist")]
    UnknownMagnet(MagnetRef),

    #[error("shape '{label}' is not a step")]
    NotAMethod { label: String },

    #[error("cables must run from an output magnet to an input magnet")]
    WrongDirection,

    #[error("magnet '{source_magnet}' cannot feed '{dest_magnet}': datatypes differ")]
    IncompatibleMagnets {
        source_magnet: String,
        dest_magnet: String,
    },

    #[error("a cable from '{source_shape}' to '{dest_shape}' would close a loop")]
    WouldCreateCycle {
        source_shape: String,
        dest_shape: String,
    },

    #[error("input magnet '{magnet}' already has a cable")]
    InputMagnetOccupied { magnet: String },
}

impl GraphError {
    pub fn missing_shape(name: impl Into<String>) -> Self {
        Self::MissingShape { name: name.into() }
    }

    pub fn duplicate_label(label: impl Into<String>, count: usize) -> Self {
        Self::DuplicateLabel {
            label: label.into(),
            count,
        }
    }

    pub fn missing_magnet(shape: impl Into<String>, magnet: impl Into<String>) -> Self {
        Self::MissingMagnet {
            shape: shape.into(),
            magnet: magnet.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(GraphError::NoInputs.to_string(), "pipeline has no inputs");
        let err = GraphError::UnconnectedMethodMagnet {
            method: "sort".to_string(),
            magnet: "rows".to_string(),
        };
        assert!(err.to_string().contains("'sort'"));
        assert!(err.to_string().contains("'rows'"));
        assert!(GraphError::missing_magnet("step", "x")
            .to_string()
            .contains("no magnet 'x'"));
    }
}
