//! GPU-free backend for renderer tests.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec2};

use super::backend::{BatchBackend, BatchDraw, BatchUniforms};
use super::{ShapeFamily, TextureId};
use crate::coords::Viewport;
use crate::paint::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub family: ShapeFamily,
    pub z_index: i32,
    pub vertex_count: usize,
    pub index_count: u32,
    pub textures: Vec<TextureId>,
    pub uniforms: BatchUniforms,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Clear { color: Color, viewport: Viewport },
    CreateBuffers { family: ShapeFamily, max_shapes: usize, index_count: usize },
    Draw(RecordedDraw),
    Finish,
}

/// Buffers handed out by [`RecordingBackend`]; decrements the live count on drop.
pub struct RecordingBuffers {
    live: Rc<Cell<usize>>,
}

impl Drop for RecordingBuffers {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<RecordedCall>,
    pub fail_with: Option<String>,
    /// Records draws but reports them as skipped.
    pub skip_draws: bool,
    live: Rc<Cell<usize>>,
}

impl RecordingBackend {
    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.calls.iter().filter_map(|c| match c {
            RecordedCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn live_buffers(&self) -> usize {
        self.live.get()
    }
}

impl BatchBackend for RecordingBackend {
    type Buffers = RecordingBuffers;

    fn clear(&mut self, color: Color, viewport: Viewport) {
        self.calls.push(RecordedCall::Clear { color, viewport });
    }

    fn create_buffers(
        &mut self,
        family: ShapeFamily,
        max_shapes: usize,
        indices: &[u32],
    ) -> RecordingBuffers {
        self.calls.push(RecordedCall::CreateBuffers {
            family,
            max_shapes,
            index_count: indices.len(),
        });
        self.live.set(self.live.get() + 1);
        RecordingBuffers { live: Rc::clone(&self.live) }
    }

    fn draw(&mut self, _buffers: &mut RecordingBuffers, draw: &BatchDraw<'_>) -> bool {
        self.calls.push(RecordedCall::Draw(RecordedDraw {
            family: draw.family,
            z_index: draw.z_index,
            vertex_count: draw.vertices.len(),
            index_count: draw.index_count,
            textures: draw.textures.iter().map(|t| t.id()).collect(),
            uniforms: draw.uniforms,
            viewport: draw.viewport,
        }));
        !self.skip_draws
    }

    fn finish(&mut self) -> Option<String> {
        self.calls.push(RecordedCall::Finish);
        self.fail_with.take()
    }
}

pub fn uniforms() -> BatchUniforms {
    BatchUniforms {
        world_projection: Mat4::IDENTITY,
        view: Mat4::IDENTITY,
        screen_size: Vec2::new(800.0, 600.0),
        time: 0.0,
        texture_slots: BatchUniforms::slot_table(0),
    }
}
