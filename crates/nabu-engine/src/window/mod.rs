//! Window and event loop.
//!
//! Owns the winit event loop and the main window, and wires them to the GPU
//! layer and the app callbacks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
