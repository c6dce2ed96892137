//! Coordinate and geometry types shared across the engine.
//!
//! World space (batched shapes):
//! - units are world pixels, origin bottom-left, +X right, +Y up
//! - the camera maps world space to clip space
//!
//! Normalized space (`normalized = true` requests):
//! - `[0, 1]` across the viewport, origin bottom-left
//!
//! Texture space: `[0, 1]`, origin top-left, +V down.

mod rect;
mod viewport;

pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use rect::Rect;
pub use viewport::Viewport;
