//! Structural validation run before a pipeline is serialized

use super::error::GraphError;
use super::model::Graph;
use super::shape::Magnet;

impl Graph {
    /// Check that the graph describes a complete, submittable pipeline.
    ///
    /// Every input feeds exactly one magnet, every output is fed by exactly
    /// one cable, every step has all of its magnets connected, and the shape
    /// list agrees with the input/step/output subsets.
    pub fn assert_integrity(&self) -> Result<(), GraphError> {
        if self.is_empty() {
            return Err(GraphError::EmptyPipeline);
        }
        if self.inputs().is_empty() {
            return Err(GraphError::NoInputs);
        }
        if self.methods().is_empty() {
            return Err(GraphError::NoMethods);
        }
        if self.outputs().is_empty() {
            return Err(GraphError::NoOutputs);
        }

        let (inputs, methods, outputs) = (
            self.inputs().len(),
            self.methods().len(),
            self.outputs().len(),
        );
        if self.len() != inputs + methods + outputs {
            return Err(GraphError::ShapeCountMismatch {
                total: self.len(),
                inputs,
                methods,
                outputs,
            });
        }

        for shape in self.inputs().iter().filter_map(|&id| self.shape(id)) {
            if connected_count(shape.out_magnets()) != 1 {
                return Err(GraphError::DisconnectedInput {
                    label: shape.label.clone(),
                });
            }
        }

        for shape in self.outputs().iter().filter_map(|&id| self.shape(id)) {
            if connected_count(shape.in_magnets()) != 1 {
                return Err(GraphError::DisconnectedOutput {
                    label: shape.label.clone(),
                });
            }
        }

        for shape in self.methods().iter().filter_map(|&id| self.shape(id)) {
            let loose = shape
                .in_magnets()
                .iter()
                .chain(shape.out_magnets())
                .find(|m| !m.is_connected());
            if let Some(magnet) = loose {
                return Err(GraphError::UnconnectedMethodMagnet {
                    method: shape.label.clone(),
                    magnet: magnet.label.clone(),
                });
            }
        }

        Ok(())
    }
}

fn connected_count(magnets: &[Magnet]) -> usize {
    magnets.iter().filter(|m| m.is_connected()).count()
}
