//! Error types for phase ordering and auto-layout

use thiserror::Error;

/// Reasons an execution order or layout could not be produced.
///
/// None of these are fatal: callers keep the last good layout or fall back to
/// an unordered step list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    /// Some steps still have unconnected inputs, so no order exists yet
    #[error("execution order is indeterminate: {} cannot be placed", unplaced.join(", "))]
    IndeterminateOrder { unplaced: Vec<String> },

    /// Layering ran for more rounds than there are steps
    #[error("phase ordering gave up after {limit} rounds")]
    IterationCap { limit: usize },

    /// Alignment of a visual layer produced a NaN or infinite coordinate
    #[error("layer {layer} has no finite centre")]
    NonFiniteCentroid { layer: usize },
}

impl LayoutError {
    /// Create an indeterminate-order error naming the stuck steps
    pub fn indeterminate(unplaced: Vec<String>) -> Self {
        Self::IndeterminateOrder { unplaced }
    }

    pub fn iteration_cap(limit: usize) -> Self {
        Self::IterationCap { limit }
    }

    pub fn non_finite_centroid(layer: usize) -> Self {
        Self::NonFiniteCentroid { layer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indeterminate_display() {
        let err = LayoutError::indeterminate(vec!["sort".to_string(), "merge".to_string()]);
        assert_eq!(
            err.to_string(),
            "execution order is indeterminate: sort, merge cannot be placed"
        );
    }

    #[test]
    fn test_centroid_display() {
        assert!(LayoutError::non_finite_centroid(2)
            .to_string()
            .contains("layer 2"));
    }
}
