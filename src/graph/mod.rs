//! Graph model: shapes, their magnets, and the connectors between them
//!
//! Shapes and connectors live in arenas owned by [`Graph`] and refer to each
//! other through copyable ids, so a magnet knows its connectors and a
//! connector knows its endpoint magnets without any shared ownership.

pub mod connector;
pub mod error;
pub mod id;
pub mod integrity;
pub mod model;
pub mod shape;

pub use connector::Connector;
pub use error::GraphError;
pub use id::{ConnectorId, MagnetRef, MagnetSide, ObjectRef, ShapeId};
pub use model::{Graph, ReplaceOutcome};
pub use shape::{Cdt, Magnet, Port, Shape, ShapeKind, MAGNET_RADIUS};
