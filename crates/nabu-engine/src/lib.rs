//! Nabu engine crate.
//!
//! A batched 2D renderer over wgpu: draw calls are grouped into
//! capacity-bounded batches by shape family, z-index and texture set, and
//! each batch is drawn with one indexed draw call. Around it sit the window
//! runtime, input, timing, camera, sprites, text and a small asset cache.

pub mod assets;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod text;
pub mod time;
pub mod window;
