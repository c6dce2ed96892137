//! wgpu device and window surface.
//!
//! [`Gpu`] owns the adapter, device, queue and the configured swapchain
//! surface, and hands out one [`GpuFrame`] (encoder + color view) per frame.

mod gpu;
mod surface;

pub use gpu::{Gpu, GpuFrame, GpuInit};
pub use surface::SurfaceErrorAction;
