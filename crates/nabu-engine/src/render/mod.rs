//! Batched 2D rendering.
//!
//! Draw calls are recorded into [`RenderBatch`]es grouped by shape family,
//! z-index and texture set, then emitted by [`Renderer::flush`] with one GPU
//! draw call per batch.
//!
//! Convention:
//! - world geometry is in world units, bottom-left origin, +Y up
//! - the [`Camera`] maps world space to clip space
//! - normalized requests bypass the camera (`[0, 1]` screen space)

mod backend;
mod batch;
mod camera;
mod ctx;
mod renderer;
mod request;
mod slots;
mod sprite;
mod texture;
mod vertex;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BatchBackend, BatchDraw, BatchUniforms};
pub use batch::{BatchState, RenderBatch};
pub use camera::{Camera, DEFAULT_TILES, TILE_SIZE};
pub use ctx::{RenderCtx, RenderTarget};
pub use renderer::{FrameStats, Renderer, RendererConfig, RendererConfigError};
pub use request::{DrawRequest, ShapeFamily, ShapeKind, TexCoords};
pub use slots::{TextureSlots, MAX_TEXTURE_SLOTS, NO_TEXTURE_SLOT};
pub use sprite::{Sprite, SpriteSheet};
pub use texture::{GpuTexture, Texture, TextureHandle, TextureId};
pub use vertex::{generate_indices, quad_corners, Vertex, INDICES_PER_SHAPE, VERTICES_PER_SHAPE};
pub use wgpu_backend::{BatchPipelines, WgpuBackend, WgpuBatchBuffers};
