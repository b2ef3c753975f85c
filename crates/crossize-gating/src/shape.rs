//! Gate geometry and point containment
//!
//! All coordinates are in data space.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// A point in data space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for DataPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in data space (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct DataRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DataRect {
    /// Build from two opposite corners in any order
    pub fn from_corners(a: DataPoint, b: DataPoint) -> Self {
        Self {
            x_min: a.x.min(b.x),
            x_max: a.x.max(b.x),
            y_min: a.y.min(b.y),
            y_max: a.y.max(b.y),
        }
    }

    pub fn contains(&self, p: DataPoint) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> DataPoint {
        DataPoint::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

/// Region used to gate a sub-population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateShape {
    /// Axis-aligned rectangle, bounds inclusive
    Rectangle(DataRect),

    /// Axis-aligned ellipse with center and semi-axes
    Ellipse { center: DataPoint, rx: f64, ry: f64 },

    /// Closed polygon (last vertex connects to the first)
    Polygon { vertices: Vec<DataPoint> },
}

impl GateShape {
    /// Rectangle from bounds given in any order
    pub fn rectangle(x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        GateShape::Rectangle(DataRect::from_corners(
            DataPoint::new(x1, y1),
            DataPoint::new(x2, y2),
        ))
    }

    /// Ellipse with positive semi-axes
    pub fn ellipse(center: DataPoint, rx: f64, ry: f64) -> GateResult<Self> {
        if !(rx > 0.0 && ry > 0.0) {
            return Err(GateError::InvalidGeometry(format!(
                "ellipse semi-axes must be positive, got rx={rx}, ry={ry}"
            )));
        }
        Ok(GateShape::Ellipse { center, rx, ry })
    }

    /// Ellipse inscribed in a rectangle
    pub fn ellipse_in(rect: &DataRect) -> GateResult<Self> {
        Self::ellipse(rect.center(), rect.width() / 2.0, rect.height() / 2.0)
    }

    /// Polygon with at least three vertices
    pub fn polygon(vertices: Vec<DataPoint>) -> GateResult<Self> {
        if vertices.len() < 3 {
            return Err(GateError::TooFewVertices(vertices.len()));
        }
        Ok(GateShape::Polygon { vertices })
    }

    /// Short name of the shape kind
    pub fn kind(&self) -> &'static str {
        match self {
            GateShape::Rectangle(_) => "rectangle",
            GateShape::Ellipse { .. } => "ellipse",
            GateShape::Polygon { .. } => "polygon",
        }
    }

    /// Test if a point is inside the shape
    pub fn contains(&self, point: DataPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        match self {
            GateShape::Rectangle(rect) => rect.contains(point),
            GateShape::Ellipse { center, rx, ry } => {
                let dx = (point.x - center.x) / rx;
                let dy = (point.y - center.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
            GateShape::Polygon { vertices } => point_in_polygon(vertices, point),
        }
    }

    /// Smallest rectangle enclosing the shape
    pub fn bounding_box(&self) -> DataRect {
        match self {
            GateShape::Rectangle(rect) => *rect,
            GateShape::Ellipse { center, rx, ry } => DataRect {
                x_min: center.x - rx,
                x_max: center.x + rx,
                y_min: center.y - ry,
                y_max: center.y + ry,
            },
            GateShape::Polygon { vertices } => {
                let mut rect = DataRect {
                    x_min: f64::INFINITY,
                    x_max: f64::NEG_INFINITY,
                    y_min: f64::INFINITY,
                    y_max: f64::NEG_INFINITY,
                };
                for v in vertices {
                    rect.x_min = rect.x_min.min(v.x);
                    rect.x_max = rect.x_max.max(v.x);
                    rect.y_min = rect.y_min.min(v.y);
                    rect.y_max = rect.y_max.max(v.y);
                }
                rect
            }
        }
    }

    /// Indices of the points inside the shape
    pub fn select(&self, points: &[DataPoint]) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| self.contains(**p))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Ray-casting parity test
fn point_in_polygon(vertices: &[DataPoint], p: DataPoint) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
