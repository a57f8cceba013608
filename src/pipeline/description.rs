//! Declarative pipeline description exchanged with the outside world
//!
//! Positions are fractions of the canvas size so a description survives a
//! change of canvas dimensions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineDescription {
    pub inputs: Vec<InputDescription>,
    pub steps: Vec<StepDescription>,
    #[serde(default)]
    pub outcables: Vec<OutcableDescription>,
}

/// A pipeline input; raw when it has no compound datatype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescription {
    pub dataset_name: String,
    /// 1-based position among the inputs
    pub dataset_idx: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounddatatype: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescription {
    pub name: String,
    /// 1-based position in the execution order
    pub step_num: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub inputs: Vec<PortDescription>,
    #[serde(default)]
    pub outputs: Vec<PortDescription>,
    #[serde(default)]
    pub cables_in: Vec<CableDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDescription {
    pub dataset_name: String,
    pub dataset_idx: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compounddatatype: Option<u32>,
}

/// A cable into a step. `source_step` 0 means a pipeline input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CableDescription {
    pub source_step: usize,
    pub source_dataset_name: String,
    pub dest_dataset_name: String,
}

/// A cable from a step output to a pipeline output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcableDescription {
    pub output_name: String,
    pub output_idx: usize,
    pub source_step: usize,
    pub source_dataset_name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_cdt: Option<u32>,
}

impl PipelineDescription {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
