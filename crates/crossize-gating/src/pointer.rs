//! Pointer input for the gating surface
//!
//! A platform-neutral pointer model: hosts translate their mouse/touch events
//! into [`PointerEvent`]s and feed them to the surface.

use serde::{Deserialize, Serialize};

use crate::transform::PixelPoint;

/// Pointer button
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Modifier key state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Cmd on macOS
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Check if any modifier is pressed
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer event in pixel coordinates relative to the chart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Button pressed
    Down {
        button: PointerButton,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    /// Pointer moved
    Move { x: f64, y: f64, modifiers: Modifiers },

    /// Button released
    Up {
        button: PointerButton,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },

    /// Pointer left the chart
    Leave,
}

impl PointerEvent {
    /// Primary-button press without modifiers
    pub fn down(x: f64, y: f64) -> Self {
        PointerEvent::Down {
            button: PointerButton::Primary,
            x,
            y,
            modifiers: Modifiers::new(),
        }
    }

    /// Move without modifiers
    pub fn moved(x: f64, y: f64) -> Self {
        PointerEvent::Move {
            x,
            y,
            modifiers: Modifiers::new(),
        }
    }

    /// Primary-button release without modifiers
    pub fn up(x: f64, y: f64) -> Self {
        PointerEvent::Up {
            button: PointerButton::Primary,
            x,
            y,
            modifiers: Modifiers::new(),
        }
    }

    /// Get position for events that have one
    pub fn position(&self) -> Option<PixelPoint> {
        match self {
            PointerEvent::Down { x, y, .. }
            | PointerEvent::Move { x, y, .. }
            | PointerEvent::Up { x, y, .. } => Some(PixelPoint::new(*x, *y)),
            PointerEvent::Leave => None,
        }
    }

    /// Get modifiers for events that have them
    pub fn modifiers(&self) -> Option<Modifiers> {
        match self {
            PointerEvent::Down { modifiers, .. }
            | PointerEvent::Move { modifiers, .. }
            | PointerEvent::Up { modifiers, .. } => Some(*modifiers),
            PointerEvent::Leave => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position() {
        assert_eq!(
            PointerEvent::down(3.0, 4.0).position(),
            Some(PixelPoint::new(3.0, 4.0))
        );
        assert_eq!(PointerEvent::Leave.position(), None);
    }

    #[test]
    fn test_modifiers() {
        let event = PointerEvent::Move {
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::new().with_shift(),
        };
        assert!(event.modifiers().unwrap().any());
        assert!(!PointerEvent::up(1.0, 1.0).modifiers().unwrap().any());
    }
}
