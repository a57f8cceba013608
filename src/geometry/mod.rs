//! Geometry kernel: points, bounds, containment tests and the isometric view
//!
//! Everything here is stateless. Coordinates follow the canvas convention of
//! x to the right and y pointing down.

pub mod contains;
pub mod isometric;
pub mod types;

pub use contains::{ellipse_contains, polygon_contains, rect_contains};
pub use isometric::IsometricTransform;
pub use types::{BoundingBox, Point};
