//! Shape variants, their outlines and their magnets

use std::f64::consts::FRAC_1_SQRT_2;

use crate::geometry::{ellipse_contains, polygon_contains, rect_contains, BoundingBox, Point};

use super::id::{ConnectorId, MagnetSide};

/// Radius of a magnet's hit circle
pub const MAGNET_RADIUS: f64 = 5.0;

const CYLINDER_RADIUS: f64 = 20.0;
const CYLINDER_BODY: f64 = 25.0;
const CYLINDER_CAP: f64 = CYLINDER_RADIUS / 2.0;

const PRISM_WIDTH: f64 = 45.0;
const PRISM_HEIGHT: f64 = 40.0;
const PRISM_BEVEL: f64 = 10.0;

const METHOD_WIDTH: f64 = 80.0;
const METHOD_PADDING: f64 = 10.0;
const METHOD_MAGNET_SPACING: f64 = 18.0;

/// Compound datatype identifier carried by typed magnets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cdt(pub u32);

/// Declaration of a magnet before it is attached to a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub label: String,
    pub cdt: Option<Cdt>,
}

impl Port {
    pub fn raw(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cdt: None,
        }
    }

    pub fn typed(label: impl Into<String>, cdt: Cdt) -> Self {
        Self {
            label: label.into(),
            cdt: Some(cdt),
        }
    }
}

/// An attachment point on a shape
#[derive(Debug, Clone, PartialEq)]
pub struct Magnet {
    pub label: String,
    pub cdt: Option<Cdt>,
    pub side: MagnetSide,
    /// Position relative to the owning shape's centre
    pub offset: Point,
    pub(crate) connected: Vec<ConnectorId>,
}

impl Magnet {
    fn new(port: Port, side: MagnetSide, offset: Point) -> Self {
        Self {
            label: port.label,
            cdt: port.cdt,
            side,
            offset,
            connected: Vec::new(),
        }
    }

    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connected
    }

    pub fn is_connected(&self) -> bool {
        !self.connected.is_empty()
    }

    /// Whether a cable from this magnet may land on `dest`: datatypes match or
    /// either side is raw.
    pub fn accepts(&self, dest: &Magnet) -> bool {
        match (self.cdt, dest.cdt) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// The closed set of things that can sit on the canvas
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    RawInput,
    StructuredInput { cdt: Cdt },
    Method,
    Output { cdt: Option<Cdt> },
    OutputZone { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub label: String,
    /// Centre of the shape
    pub x: f64,
    pub y: f64,
    /// Displacement accumulated during a drag or collision pass
    pub dx: f64,
    pub dy: f64,
    pub(crate) in_magnets: Vec<Magnet>,
    pub(crate) out_magnets: Vec<Magnet>,
}

impl Shape {
    fn with_magnets(
        kind: ShapeKind,
        label: impl Into<String>,
        centre: Point,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
    ) -> Self {
        let mut shape = Self {
            kind,
            label: label.into(),
            x: centre.x,
            y: centre.y,
            dx: 0.0,
            dy: 0.0,
            in_magnets: Vec::new(),
            out_magnets: Vec::new(),
        };
        let (width, height) = shape.size_for(inputs.len(), outputs.len());
        shape.in_magnets = layout_magnets(inputs, MagnetSide::Input, width, height);
        shape.out_magnets = layout_magnets(outputs, MagnetSide::Output, width, height);
        shape
    }

    pub fn raw_input(label: impl Into<String>, centre: Point) -> Self {
        let label = label.into();
        let port = Port::raw(label.clone());
        Self::with_magnets(ShapeKind::RawInput, label, centre, vec![], vec![port])
    }

    pub fn structured_input(label: impl Into<String>, cdt: Cdt, centre: Point) -> Self {
        let label = label.into();
        let port = Port::typed(label.clone(), cdt);
        Self::with_magnets(
            ShapeKind::StructuredInput { cdt },
            label,
            centre,
            vec![],
            vec![port],
        )
    }

    pub fn method(
        label: impl Into<String>,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
        centre: Point,
    ) -> Self {
        Self::with_magnets(ShapeKind::Method, label, centre, inputs, outputs)
    }

    pub fn output(label: impl Into<String>, cdt: Option<Cdt>, centre: Point) -> Self {
        let label = label.into();
        let port = Port {
            label: label.clone(),
            cdt,
        };
        Self::with_magnets(ShapeKind::Output { cdt }, label, centre, vec![port], vec![])
    }

    pub fn output_zone(bounds: BoundingBox) -> Self {
        Self::with_magnets(
            ShapeKind::OutputZone {
                width: bounds.width,
                height: bounds.height,
            },
            "output zone",
            bounds.center(),
            vec![],
            vec![],
        )
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::RawInput | ShapeKind::StructuredInput { .. }
        )
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, ShapeKind::Method)
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, ShapeKind::Output { .. })
    }

    /// Only steps take part in execution ordering
    pub fn affects_exec_order(&self) -> bool {
        self.is_method()
    }

    pub fn is_immovable(&self) -> bool {
        matches!(self.kind, ShapeKind::OutputZone { .. })
    }

    pub fn in_magnets(&self) -> &[Magnet] {
        &self.in_magnets
    }

    pub fn out_magnets(&self) -> &[Magnet] {
        &self.out_magnets
    }

    pub fn magnets(&self, side: MagnetSide) -> &[Magnet] {
        match side {
            MagnetSide::Input => &self.in_magnets,
            MagnetSide::Output => &self.out_magnets,
        }
    }

    pub(crate) fn magnets_mut(&mut self, side: MagnetSide) -> &mut Vec<Magnet> {
        match side {
            MagnetSide::Input => &mut self.in_magnets,
            MagnetSide::Output => &mut self.out_magnets,
        }
    }

    /// Every magnet has at least one cable
    pub fn is_fully_connected(&self) -> bool {
        self.in_magnets
            .iter()
            .chain(&self.out_magnets)
            .all(Magnet::is_connected)
    }

    /// Current centre including the transient offset
    pub fn centre(&self) -> Point {
        Point::new(self.x + self.dx, self.y + self.dy)
    }

    /// Fold the transient offset into the resting position
    pub fn fold_offset(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
        self.dx = 0.0;
        self.dy = 0.0;
    }

    pub fn magnet_position(&self, magnet: &Magnet) -> Point {
        self.centre() + magnet.offset
    }

    fn size_for(&self, inputs: usize, outputs: usize) -> (f64, f64) {
        match self.kind {
            ShapeKind::RawInput | ShapeKind::Output { .. } => {
                (2.0 * CYLINDER_RADIUS, CYLINDER_BODY + 2.0 * CYLINDER_CAP)
            }
            ShapeKind::StructuredInput { .. } => (PRISM_WIDTH, PRISM_HEIGHT),
            ShapeKind::Method => {
                let rows = inputs.max(outputs).max(1) as f64;
                (
                    METHOD_WIDTH,
                    rows * METHOD_MAGNET_SPACING + 2.0 * METHOD_PADDING,
                )
            }
            ShapeKind::OutputZone { width, height } => (width, height),
        }
    }

    /// Width and height of the shape's outline
    pub fn size(&self) -> (f64, f64) {
        self.size_for(self.in_magnets.len(), self.out_magnets.len())
    }

    /// Axis-aligned bounds of the outline at the current centre
    pub fn bounds(&self) -> BoundingBox {
        let (w, h) = self.size();
        let c = self.centre();
        BoundingBox::new(c.x - w / 2.0, c.y - h / 2.0, w, h)
    }

    /// Outline polygon for polygonal shapes
    fn polygon(&self) -> Option<Vec<Point>> {
        let c = self.centre();
        match self.kind {
            ShapeKind::StructuredInput { .. } => {
                let hw = PRISM_WIDTH / 2.0;
                let hh = PRISM_HEIGHT / 2.0;
                Some(vec![
                    Point::new(c.x - hw, c.y - hh + PRISM_BEVEL),
                    Point::new(c.x, c.y - hh),
                    Point::new(c.x + hw, c.y - hh + PRISM_BEVEL),
                    Point::new(c.x + hw, c.y + hh - PRISM_BEVEL),
                    Point::new(c.x, c.y + hh),
                    Point::new(c.x - hw, c.y + hh - PRISM_BEVEL),
                ])
            }
            ShapeKind::Method | ShapeKind::OutputZone { .. } => {
                let b = self.bounds();
                Some(vec![
                    Point::new(b.x, b.y),
                    Point::new(b.right(), b.y),
                    Point::new(b.right(), b.bottom()),
                    Point::new(b.x, b.bottom()),
                ])
            }
            ShapeKind::RawInput | ShapeKind::Output { .. } => None,
        }
    }

    /// Probe points used for collision detection: the outline's corners and
    /// edge midpoints, or ten points around a cylinder.
    pub fn vertices(&self) -> Vec<Point> {
        if let Some(polygon) = self.polygon() {
            let n = polygon.len();
            let mut vertices = Vec::with_capacity(n * 2);
            for i in 0..n {
                let a = polygon[i];
                let b = polygon[(i + 1) % n];
                vertices.push(a);
                vertices.push(a.lerp(b, 0.5));
            }
            return vertices;
        }

        let c = self.centre();
        let r = CYLINDER_RADIUS;
        let top = c.y - CYLINDER_BODY / 2.0;
        let bottom = c.y + CYLINDER_BODY / 2.0;
        let diag_x = r * FRAC_1_SQRT_2;
        let diag_y = CYLINDER_CAP * FRAC_1_SQRT_2;
        vec![
            Point::new(c.x, top - CYLINDER_CAP),
            Point::new(c.x + diag_x, top - diag_y),
            Point::new(c.x + r, top),
            Point::new(c.x + r, bottom),
            Point::new(c.x + diag_x, bottom + diag_y),
            Point::new(c.x, bottom + CYLINDER_CAP),
            Point::new(c.x - diag_x, bottom + diag_y),
            Point::new(c.x - r, bottom),
            Point::new(c.x - r, top),
            Point::new(c.x - diag_x, top - diag_y),
        ]
    }

    pub fn contains(&self, point: Point) -> bool {
        match self.kind {
            ShapeKind::RawInput | ShapeKind::Output { .. } => {
                let c = self.centre();
                let top = Point::new(c.x, c.y - CYLINDER_BODY / 2.0);
                let bottom = Point::new(c.x, c.y + CYLINDER_BODY / 2.0);
                let body = BoundingBox::new(
                    c.x - CYLINDER_RADIUS,
                    top.y,
                    2.0 * CYLINDER_RADIUS,
                    CYLINDER_BODY,
                );
                rect_contains(&body, point)
                    || ellipse_contains(top, CYLINDER_RADIUS, CYLINDER_CAP, point)
                    || ellipse_contains(bottom, CYLINDER_RADIUS, CYLINDER_CAP, point)
            }
            ShapeKind::Method | ShapeKind::OutputZone { .. } => {
                rect_contains(&self.bounds(), point)
            }
            ShapeKind::StructuredInput { .. } => self
                .polygon()
                .is_some_and(|polygon| polygon_contains(&polygon, point)),
        }
    }
}

fn layout_magnets(ports: Vec<Port>, side: MagnetSide, width: f64, height: f64) -> Vec<Magnet> {
    let x = match side {
        MagnetSide::Input => -width / 2.0,
        MagnetSide::Output => width / 2.0,
    };
    let count = ports.len();
    ports
        .into_iter()
        .enumerate()
        .map(|(i, port)| {
            let y = if count == 1 {
                0.0
            } else {
                -height / 2.0 + METHOD_PADDING + METHOD_MAGNET_SPACING * (i as f64 + 0.5)
            };
            Magnet::new(port, side, Point::new(x, y))
        })
        .collect()
}
