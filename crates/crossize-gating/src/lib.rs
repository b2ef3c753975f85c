//! crossize-gating - Interactive gating on 2D scatter plots
//!
//! A gate is a user-drawn region over a (channel-x, channel-y) scatter that
//! picks out a sub-population of events:
//!
//! - **Shapes**: rectangle, ellipse, and polygon containment tests
//! - **Gates**: named, colored, toggleable shapes collected in a [`GateSet`]
//! - **Transforms**: pixel <-> data coordinates with an inverted y axis
//! - **Surface**: the drag-to-select / pan / zoom state machine
//!
//! # Coordinate spaces
//!
//! Gate geometry is always stored in data space so it survives pan and zoom.
//! Pixel space only exists inside [`GatingSurface`] while a gesture is in
//! progress.
//!
//! # Examples
//!
//! ```
//! use crossize_gating::{DataPoint, GateShape};
//!
//! let gate = GateShape::rectangle(0.0, 10.0, 0.0, 5.0);
//! assert!(gate.contains(DataPoint::new(3.0, 4.0)));
//! assert!(!gate.contains(DataPoint::new(11.0, 4.0)));
//! ```

pub mod error;
pub mod gate;
pub mod pointer;
pub mod shape;
pub mod surface;
pub mod transform;

pub use error::*;
pub use gate::*;
pub use pointer::*;
pub use shape::*;
pub use surface::*;
pub use transform::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
