//! Paint model shared between the renderer and callers.
//!
//! Scope: color representation only. Geometry types live in `coords`.

pub mod color;

pub use color::{Color, ColorParseError};
