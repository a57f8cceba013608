//! Identity types for the graph arenas.
//!
//! Ids are newtypes over `u32` that index directly into the arena vectors.
//! Slots are never reused, so a stale id can only miss, never alias.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub u32);

impl ShapeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeId({})", self.0)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(pub u32);

impl ConnectorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectorId({})", self.0)
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Which side of a shape a magnet sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagnetSide {
    Input,
    Output,
}

/// Address of a magnet: owning shape, side, and position on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MagnetRef {
    pub shape: ShapeId,
    pub side: MagnetSide,
    pub index: usize,
}

impl MagnetRef {
    pub fn input(shape: ShapeId, index: usize) -> Self {
        Self {
            shape,
            side: MagnetSide::Input,
            index,
        }
    }

    pub fn output(shape: ShapeId, index: usize) -> Self {
        Self {
            shape,
            side: MagnetSide::Output,
            index,
        }
    }
}

/// Anything that can be selected and deleted on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Shape(ShapeId),
    Connector(ConnectorId),
}
