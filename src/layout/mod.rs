//! Execution ordering and placement of shapes on the canvas
//!
//! [`PhaseOrder`] groups steps into phases, [`CollisionResolver`] keeps shapes
//! from overlapping while they are dragged, and [`auto_layout`] throws away
//! the current positions and lays the whole pipeline out again.

pub mod auto;
pub mod collision;
pub mod config;
pub mod error;
pub mod phase;

pub use auto::{auto_layout, visual_layers};
pub use collision::{overlaps, CollisionReport, CollisionResolver};
pub use config::{CanvasConfig, ConfigError};
pub use error::LayoutError;
pub use phase::PhaseOrder;
