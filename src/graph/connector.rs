//! Cables between magnets

use std::cell::Cell;

use crate::bezier::CubicCurve;
use crate::geometry::Point;

use super::id::MagnetRef;

/// Minimum horizontal reach of a cable's control points
const MIN_CONTROL_OFFSET: f64 = 20.0;

/// A directed cable from an output magnet to (at most) one input magnet.
///
/// While the cable is being dragged `dest` is `None` and the loose end sits at
/// `free_end`. The Bezier curve is computed on demand and cached until either
/// endpoint moves.
#[derive(Debug, Clone)]
pub struct Connector {
    source: MagnetRef,
    pub(crate) dest: Option<MagnetRef>,
    pub(crate) free_end: Point,
    curve: Cell<Option<CubicCurve>>,
}

impl Connector {
    pub(crate) fn new(source: MagnetRef, dest: Option<MagnetRef>, free_end: Point) -> Self {
        Self {
            source,
            dest,
            free_end,
            curve: Cell::new(None),
        }
    }

    pub fn source(&self) -> MagnetRef {
        self.source
    }

    pub fn dest(&self) -> Option<MagnetRef> {
        self.dest
    }

    pub fn is_attached(&self) -> bool {
        self.dest.is_some()
    }

    /// Where the loose end of a dragged cable currently is
    pub fn free_end(&self) -> Point {
        self.free_end
    }

    pub(crate) fn invalidate(&self) {
        self.curve.set(None);
    }

    pub(crate) fn cached_curve(&self) -> Option<CubicCurve> {
        self.curve.get()
    }

    pub(crate) fn cache_curve(&self, curve: CubicCurve) {
        self.curve.set(Some(curve));
    }
}

/// Cubic curve leaving `from` and entering `to` horizontally
pub fn cable_curve(from: Point, to: Point) -> CubicCurve {
    let reach = ((to.x - from.x).abs() / 2.0).max(MIN_CONTROL_OFFSET);
    [
        from,
        Point::new(from.x + reach, from.y),
        Point::new(to.x - reach, to.y),
        to,
    ]
}
