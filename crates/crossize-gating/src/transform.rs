//! Pixel <-> data coordinate transforms
//!
//! Pixel y grows downward while data y grows upward, so the y axis is
//! inverted when converting between the two spaces.

use serde::{Deserialize, Serialize};

use crate::shape::{DataPoint, DataRect};

/// A position in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in pixel space, normalized so `left <= right` and `top <= bottom`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// The plotting region inside a chart, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Plot area inside a chart of `width` x `height` with uniform `margin`
    pub fn with_margin(width: f64, height: f64, margin: f64) -> Self {
        Self::new(
            margin,
            margin,
            (width - 2.0 * margin).max(0.0),
            (height - 2.0 * margin).max(0.0),
        )
    }

    /// Whether the area spans at least one pixel on both axes
    pub fn has_extent(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }

    /// Clamp a pixel position into the plot area
    pub fn clamp(&self, p: PixelPoint) -> PixelPoint {
        PixelPoint::new(
            p.x.clamp(self.left, self.left + self.width),
            p.y.clamp(self.top, self.top + self.height),
        )
    }
}

/// The visible data window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct ViewBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Bounds enclosing all finite points, padded by `padding` of each span
    ///
    /// A zero-width axis is widened by one unit on each side so transforms
    /// never divide by zero.
    pub fn from_points(points: &[DataPoint], padding: f64) -> Option<Self> {
        let mut finite = points.iter().filter(|p| p.is_finite());
        let first = finite.next()?;
        let mut bounds = Self::new(first.x, first.x, first.y, first.y);
        for p in finite {
            bounds.x_min = bounds.x_min.min(p.x);
            bounds.x_max = bounds.x_max.max(p.x);
            bounds.y_min = bounds.y_min.min(p.y);
            bounds.y_max = bounds.y_max.max(p.y);
        }

        if bounds.span_x() == 0.0 {
            bounds.x_min -= 1.0;
            bounds.x_max += 1.0;
        }
        if bounds.span_y() == 0.0 {
            bounds.y_min -= 1.0;
            bounds.y_max += 1.0;
        }

        let pad_x = bounds.span_x() * padding;
        let pad_y = bounds.span_y() * padding;
        Some(Self::new(
            bounds.x_min - pad_x,
            bounds.x_max + pad_x,
            bounds.y_min - pad_y,
            bounds.y_max + pad_y,
        ))
    }

    pub fn span_x(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn span_y(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> DataPoint {
        DataPoint::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    pub fn contains(&self, p: DataPoint) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// Convert a pixel position to data coordinates
    pub fn pixel_to_data(&self, area: &PlotArea, p: PixelPoint) -> DataPoint {
        let fx = (p.x - area.left) / area.width;
        let fy = (p.y - area.top) / area.height;
        DataPoint::new(
            self.x_min + fx * self.span_x(),
            self.y_max - fy * self.span_y(),
        )
    }

    /// Convert data coordinates to a pixel position
    pub fn data_to_pixel(&self, area: &PlotArea, p: DataPoint) -> PixelPoint {
        let fx = (p.x - self.x_min) / self.span_x();
        let fy = (self.y_max - p.y) / self.span_y();
        PixelPoint::new(area.left + fx * area.width, area.top + fy * area.height)
    }

    /// Convert a pixel rectangle to a data rectangle
    pub fn pixel_rect_to_data(&self, area: &PlotArea, rect: &PixelRect) -> DataRect {
        let top_left = self.pixel_to_data(area, PixelPoint::new(rect.left, rect.top));
        let bottom_right = self.pixel_to_data(area, PixelPoint::new(rect.right, rect.bottom));
        DataRect::from_corners(top_left, bottom_right)
    }

    /// Data-space displacement corresponding to a pixel displacement
    pub fn pixel_delta_to_data(&self, area: &PlotArea, dx: f64, dy: f64) -> (f64, f64) {
        (
            dx / area.width * self.span_x(),
            -dy / area.height * self.span_y(),
        )
    }

    /// Shift the window by a data-space offset
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.x_min + dx,
            self.x_max + dx,
            self.y_min + dy,
            self.y_max + dy,
        )
    }

    /// Scale both spans by `factor` around the window center
    pub fn scaled(&self, factor: f64) -> Self {
        let c = self.center();
        let half_x = self.span_x() * factor / 2.0;
        let half_y = self.span_y() * factor / 2.0;
        Self::new(c.x - half_x, c.x + half_x, c.y - half_y, c.y + half_y)
    }
}

impl From<ViewBounds> for DataRect {
    fn from(b: ViewBounds) -> Self {
        DataRect {
            x_min: b.x_min,
            x_max: b.x_max,
            y_min: b.y_min,
            y_max: b.y_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlotArea {
        PlotArea::new(50.0, 20.0, 400.0, 300.0)
    }

    #[test]
    fn test_pixel_to_data_inverts_y() {
        let view = ViewBounds::new(0.0, 100.0, 0.0, 30.0);
        let top_left = view.pixel_to_data(&area(), PixelPoint::new(50.0, 20.0));
        assert_eq!(top_left, DataPoint::new(0.0, 30.0));

        let bottom_right = view.pixel_to_data(&area(), PixelPoint::new(450.0, 320.0));
        assert_eq!(bottom_right, DataPoint::new(100.0, 0.0));
    }

    #[test]
    fn test_round_trip() {
        let view = ViewBounds::new(-5.0, 15.0, 2.0, 8.0);
        let p = DataPoint::new(3.3, 6.1);
        let back = view.pixel_to_data(&area(), view.data_to_pixel(&area(), p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_rect_to_data() {
        let view = ViewBounds::new(0.0, 400.0, 0.0, 300.0);
        let rect = PixelRect::from_corners(PixelPoint::new(150.0, 220.0), PixelPoint::new(250.0, 120.0));
        let data = view.pixel_rect_to_data(&area(), &rect);
        assert!((data.x_min - 100.0).abs() < 1e-9);
        assert!((data.x_max - 200.0).abs() < 1e-9);
        assert!((data.y_min - 100.0).abs() < 1e-9);
        assert!((data.y_max - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_points_pads_and_handles_flat_axes() {
        let points = vec![DataPoint::new(0.0, 5.0), DataPoint::new(10.0, 5.0)];
        let bounds = ViewBounds::from_points(&points, 0.1).unwrap();
        assert_eq!(bounds.x_min, -1.0);
        assert_eq!(bounds.x_max, 11.0);
        assert!(bounds.span_y() > 0.0);
        assert!(ViewBounds::from_points(&[], 0.0).is_none());
    }

    #[test]
    fn test_scaled_keeps_center() {
        let view = ViewBounds::new(0.0, 10.0, 0.0, 4.0);
        let zoomed = view.scaled(0.5);
        assert_eq!(zoomed, ViewBounds::new(2.5, 7.5, 1.0, 3.0));
        assert_eq!(zoomed.center(), view.center());
    }

    #[test]
    fn test_pixel_delta_direction() {
        let view = ViewBounds::new(0.0, 400.0, 0.0, 300.0);
        let (dx, dy) = view.pixel_delta_to_data(&area(), 40.0, 30.0);
        assert!((dx - 40.0).abs() < 1e-9);
        assert!((dy + 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_plot_area_with_margin() {
        let area = PlotArea::with_margin(500.0, 400.0, 40.0);
        assert_eq!(area, PlotArea::new(40.0, 40.0, 420.0, 320.0));
        assert!(area.contains(PixelPoint::new(40.0, 360.0)));
        assert!(!area.contains(PixelPoint::new(39.0, 100.0)));
        assert_eq!(area.clamp(PixelPoint::new(0.0, 500.0)), PixelPoint::new(40.0, 360.0));
        assert!(area.has_extent());

        // Margins larger than the chart collapse the area
        let collapsed = PlotArea::with_margin(60.0, 60.0, 40.0);
        assert_eq!(collapsed.width, 0.0);
        assert!(!collapsed.has_extent());
    }
}
