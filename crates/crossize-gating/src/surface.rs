//! Drag-to-select, pan, and zoom over a scatter plot
//!
//! [`GatingSurface`] owns the view window and the pointer state machine.
//! Hosts forward [`PointerEvent`]s to [`GatingSurface::handle`] and react to
//! the returned [`SurfaceEvent`]s (redraw the preview rectangle, store a gate,
//! re-render after a pan).
//!
//! ```text
//!            down (inside plot)            up (>= MIN_DRAG_PIXELS)
//!   Idle ───────────────────────► Dragging ─────────────────────► Selected
//!     ▲                              │  │
//!     │          leave               │  │ up (too small)
//!     └──────────────────────────────┘  └──────────────────────► Click
//! ```

use serde::{Deserialize, Serialize};

use crate::error::GateResult;
use crate::gate::Gate;
use crate::pointer::{PointerButton, PointerEvent};
use crate::shape::{DataPoint, DataRect, GateShape};
use crate::transform::{PixelPoint, PixelRect, PlotArea, ViewBounds};

/// Drags smaller than this in either axis count as clicks
pub const MIN_DRAG_PIXELS: f64 = 5.0;

/// Zoom-out past this multiple of the full extent snaps back to full bounds
pub const MAX_ZOOM_OUT_RATIO: f64 = 1.5;

/// Fraction of the data span added around auto-computed bounds
pub const DEFAULT_PADDING: f64 = 0.05;

/// What a primary-button drag does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Pointer input is ignored
    #[default]
    None,
    Select,
    Pan,
}

/// Shape drawn by a select drag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawShape {
    #[default]
    Rectangle,
    /// Ellipse inscribed in the dragged rectangle
    Ellipse,
}

/// Pointer drag sub-state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { start: PixelPoint, last: PixelPoint },
}

/// A completed select gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Indices into the surface's points
    pub indices: Vec<usize>,
    /// Dragged rectangle in data space
    pub bounds: DataRect,
    pub shape: GateShape,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Turn the selection into a named gate on the given channels
    pub fn into_gate(
        self,
        name: impl Into<String>,
        x_channel: impl Into<String>,
        y_channel: impl Into<String>,
    ) -> GateResult<Gate> {
        Gate::new(name, self.shape, x_channel, y_channel)
    }
}

/// Outcome of feeding a pointer event to the surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Rubber-band rectangle to draw while selecting
    SelectionPreview(PixelRect),
    /// Select drag finished
    Selected(Selection),
    /// View window moved
    ViewChanged(ViewBounds),
    /// Pointer released without a meaningful drag
    Click(DataPoint),
    /// Drag aborted because the pointer left the chart
    Cancelled,
}

/// Interactive scatter-plot gating state
#[derive(Debug, Clone)]
pub struct GatingSurface {
    area: PlotArea,
    full_bounds: ViewBounds,
    view: ViewBounds,
    mode: InteractionMode,
    draw_shape: DrawShape,
    drag: DragState,
    points: Vec<DataPoint>,
}

impl GatingSurface {
    /// Surface over `points`, with the view fitted to the data
    pub fn new(area: PlotArea, points: Vec<DataPoint>) -> Self {
        let bounds = ViewBounds::from_points(&points, DEFAULT_PADDING)
            .unwrap_or_else(|| ViewBounds::new(0.0, 1.0, 0.0, 1.0));
        Self::with_bounds(area, bounds, points)
    }

    /// Surface with explicit full-data bounds
    pub fn with_bounds(area: PlotArea, bounds: ViewBounds, points: Vec<DataPoint>) -> Self {
        Self {
            area,
            full_bounds: bounds,
            view: bounds,
            mode: InteractionMode::default(),
            draw_shape: DrawShape::default(),
            drag: DragState::Idle,
            points,
        }
    }

    pub fn area(&self) -> &PlotArea {
        &self.area
    }

    pub fn view(&self) -> ViewBounds {
        self.view
    }

    pub fn full_bounds(&self) -> ViewBounds {
        self.full_bounds
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn draw_shape(&self) -> DrawShape {
        self.draw_shape
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Switch mode, cancelling any drag in progress
    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
        self.drag = DragState::Idle;
    }

    pub fn set_draw_shape(&mut self, shape: DrawShape) {
        self.draw_shape = shape;
    }

    /// Resize the plot area (the data window is unchanged)
    pub fn set_area(&mut self, area: PlotArea) {
        self.area = area;
        self.drag = DragState::Idle;
    }

    /// Replace the points and refit the view to them
    pub fn set_points(&mut self, points: Vec<DataPoint>) {
        if let Some(bounds) = ViewBounds::from_points(&points, DEFAULT_PADDING) {
            self.full_bounds = bounds;
            self.view = bounds;
        }
        self.points = points;
        self.drag = DragState::Idle;
    }

    /// Indices of points inside the current view
    pub fn visible_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_finite() && self.view.contains(**p))
            .map(|(i, _)| i)
            .collect()
    }

    /// Halve the view span around its center
    pub fn zoom_in(&mut self) -> ViewBounds {
        self.view = self.view.scaled(0.5);
        self.view
    }

    /// Double the view span, snapping back to full bounds when too wide
    pub fn zoom_out(&mut self) -> ViewBounds {
        let zoomed = self.view.scaled(2.0);
        let too_wide = zoomed.span_x() > self.full_bounds.span_x() * MAX_ZOOM_OUT_RATIO
            || zoomed.span_y() > self.full_bounds.span_y() * MAX_ZOOM_OUT_RATIO;
        self.view = if too_wide { self.full_bounds } else { zoomed };
        self.view
    }

    pub fn reset_zoom(&mut self) -> ViewBounds {
        self.view = self.full_bounds;
        self.view
    }

    /// Feed a pointer event through the state machine
    ///
    /// Input is ignored while the plot area has no extent.
    pub fn handle(&mut self, event: &PointerEvent) -> Option<SurfaceEvent> {
        if self.mode == InteractionMode::None || !self.area.has_extent() {
            return None;
        }

        match *event {
            PointerEvent::Down { button, x, y, .. } => {
                let p = PixelPoint::new(x, y);
                if button != PointerButton::Primary || !self.area.contains(p) {
                    return None;
                }
                self.drag = DragState::Dragging { start: p, last: p };
                None
            }
            PointerEvent::Move { x, y, .. } => {
                let DragState::Dragging { start, last } = self.drag else {
                    return None;
                };
                let current = self.area.clamp(PixelPoint::new(x, y));
                self.drag = DragState::Dragging {
                    start,
                    last: current,
                };
                match self.mode {
                    InteractionMode::Select => Some(SurfaceEvent::SelectionPreview(
                        PixelRect::from_corners(start, current),
                    )),
                    InteractionMode::Pan => {
                        let (dx, dy) = self.view.pixel_delta_to_data(
                            &self.area,
                            current.x - last.x,
                            current.y - last.y,
                        );
                        self.view = self.view.translated(-dx, -dy);
                        Some(SurfaceEvent::ViewChanged(self.view))
                    }
                    InteractionMode::None => None,
                }
            }
            PointerEvent::Up { button, x, y, .. } => {
                if button != PointerButton::Primary {
                    return None;
                }
                let DragState::Dragging { start, .. } = self.drag else {
                    return None;
                };
                self.drag = DragState::Idle;
                let end = self.area.clamp(PixelPoint::new(x, y));
                match self.mode {
                    InteractionMode::Select => Some(self.finish_selection(start, end)),
                    _ => None,
                }
            }
            PointerEvent::Leave => match self.drag {
                DragState::Dragging { .. } => {
                    self.drag = DragState::Idle;
                    Some(SurfaceEvent::Cancelled)
                }
                DragState::Idle => None,
            },
        }
    }

    fn finish_selection(&self, start: PixelPoint, end: PixelPoint) -> SurfaceEvent {
        let rect = PixelRect::from_corners(start, end);
        if rect.width() < MIN_DRAG_PIXELS || rect.height() < MIN_DRAG_PIXELS {
            return SurfaceEvent::Click(self.view.pixel_to_data(&self.area, end));
        }

        let bounds = self.view.pixel_rect_to_data(&self.area, &rect);
        let shape = match self.draw_shape {
            DrawShape::Rectangle => GateShape::Rectangle(bounds),
            DrawShape::Ellipse => match GateShape::ellipse_in(&bounds) {
                Ok(shape) => shape,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding degenerate ellipse selection");
                    return SurfaceEvent::Click(self.view.pixel_to_data(&self.area, end));
                }
            },
        };

        let indices = self
            .visible_indices()
            .into_iter()
            .filter(|&i| shape.contains(self.points[i]))
            .collect::<Vec<_>>();
        tracing::debug!(
            selected = indices.len(),
            shape = shape.kind(),
            "Selection completed"
        );

        SurfaceEvent::Selected(Selection {
            indices,
            bounds,
            shape,
        })
    }
}
