//! GPU seam of the batching core.
//!
//! Batches never talk to wgpu directly. A flush drives a [`BatchBackend`]:
//! one `clear`, then `create_buffers` + `draw` per batch, then `finish`.
//! The wgpu implementation lives in `wgpu_backend`; tests use a recording
//! backend.

use glam::{Mat4, Vec2};

use crate::coords::Viewport;
use crate::paint::Color;

use super::slots::MAX_TEXTURE_SLOTS;
use super::{ShapeFamily, TextureHandle, Vertex};

/// Per-draw uniform values.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BatchUniforms {
    pub world_projection: Mat4,
    pub view: Mat4,
    /// Viewport size in physical pixels.
    pub screen_size: Vec2,
    /// Seconds since the renderer was created.
    pub time: f32,
    /// Sampler binding for each slot id: `texture_slots[k - 1]` serves slot `k`.
    pub texture_slots: [i32; MAX_TEXTURE_SLOTS],
}

impl BatchUniforms {
    /// Slot table for a batch with `bound` registered textures.
    pub fn slot_table(bound: usize) -> [i32; MAX_TEXTURE_SLOTS] {
        let mut table = [0i32; MAX_TEXTURE_SLOTS];
        for (i, entry) in table.iter_mut().enumerate().take(bound.min(MAX_TEXTURE_SLOTS)) {
            *entry = i as i32 + 1;
        }
        table
    }
}

/// Everything a backend needs to issue one batch's draw call.
pub struct BatchDraw<'a> {
    pub family: ShapeFamily,
    pub z_index: i32,
    /// Live vertex range (`count * 4` vertices).
    pub vertices: &'a [Vertex],
    /// `count * 6`.
    pub index_count: u32,
    /// `textures[i]` is bound to slot `i + 1`.
    pub textures: &'a [TextureHandle],
    pub uniforms: BatchUniforms,
    pub viewport: Viewport,
}

/// GPU operations a flush needs.
pub trait BatchBackend {
    /// GPU objects owned by one batch. Dropping the value releases them.
    type Buffers;

    /// Clears the color target for a new frame.
    fn clear(&mut self, color: Color, viewport: Viewport);

    /// Creates the vertex/index buffers of a batch holding up to
    /// `max_shapes` shapes. `indices` is the batch's full static index list.
    fn create_buffers(
        &mut self,
        family: ShapeFamily,
        max_shapes: usize,
        indices: &[u32],
    ) -> Self::Buffers;

    /// Uploads the live vertex range, binds textures and uniforms and issues
    /// one indexed draw call. Returns `false` when the draw was skipped.
    fn draw(&mut self, buffers: &mut Self::Buffers, draw: &BatchDraw<'_>) -> bool;

    /// Ends the flush. Returns a description of any GPU error raised while
    /// it ran.
    fn finish(&mut self) -> Option<String>;
}
