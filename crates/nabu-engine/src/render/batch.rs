use glam::Vec2;

use super::backend::{BatchBackend, BatchDraw, BatchUniforms};
use super::slots::TextureSlots;
use super::vertex::{generate_indices, quad_corners, INDICES_PER_SHAPE, VERTICES_PER_SHAPE};
use super::{DrawRequest, ShapeFamily, ShapeKind, TextureHandle, Vertex};
use crate::coords::Viewport;

/// Lifecycle of a batch within one frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BatchState {
    /// Accepting shapes; no GPU objects yet.
    Building,
    /// GPU objects created; shapes may no longer be added.
    Started,
    /// Uploaded and drawn. The batch is dropped right after.
    Presented,
}

/// Capacity-bounded vertex batch for one shape family at one z-index.
///
/// `G` is the backend's GPU buffer type; it is created by [`start`](Self::start)
/// and released when the batch is dropped.
pub struct RenderBatch<G> {
    family: ShapeFamily,
    z_index: i32,
    max_shapes: usize,

    vertices: Vec<Vertex>,
    count: usize,
    slots: TextureSlots,

    state: BatchState,
    gpu: Option<G>,
}

impl<G> RenderBatch<G> {
    /// Creates an empty batch. The vertex array is sized for `max_shapes`
    /// up front and never reallocates.
    pub fn new(family: ShapeFamily, z_index: i32, max_shapes: usize, texture_slots: usize) -> Self {
        Self {
            family,
            z_index,
            max_shapes,
            vertices: Vec::with_capacity(max_shapes * VERTICES_PER_SHAPE),
            count: 0,
            slots: TextureSlots::new(texture_slots),
            state: BatchState::Building,
            gpu: None,
        }
    }

    #[inline]
    pub fn family(&self) -> ShapeFamily {
        self.family
    }

    #[inline]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Number of shapes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn max_shapes(&self) -> usize {
        self.max_shapes
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count >= self.max_shapes
    }

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[inline]
    pub fn accepts_kind(&self, kind: ShapeKind) -> bool {
        kind.family() == self.family
    }

    #[inline]
    pub fn has_texture(&self, texture: &TextureHandle) -> bool {
        self.slots.contains(texture)
    }

    #[inline]
    pub fn has_free_texture_slot(&self) -> bool {
        self.slots.has_free_slot()
    }

    /// Whether `request` may join this batch: same family and z-index, room
    /// for one more shape, and its texture (if any) already resident or a
    /// slot free.
    pub fn can_accept(&self, request: &DrawRequest) -> bool {
        self.state == BatchState::Building
            && self.accepts_kind(request.kind)
            && !self.is_full()
            && self.z_index == request.z_index()
            && self.slots.accepts(request.texture.as_ref())
    }

    #[inline]
    pub fn textures(&self) -> &[TextureHandle] {
        self.slots.textures()
    }

    /// Live vertex range.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Writes the four vertices of `request` at slot `len()`.
    ///
    /// The caller guarantees `can_accept(request)`; this is checked only in
    /// debug builds.
    pub fn add_shape(&mut self, request: &DrawRequest) {
        debug_assert!(!self.is_full(), "add_shape on a full batch");
        debug_assert_eq!(self.state, BatchState::Building, "add_shape after start");
        debug_assert!(self.accepts_kind(request.kind));

        let tex_slot = self.slots.slot_for(request.texture.as_ref()) as f32;
        let color = request.color.to_array();
        let z = self.z_index as f32;
        let normalized = if request.normalized { 1.0 } else { 0.0 };
        let corners = quad_corners(
            Vec2::new(request.position.x, request.position.y),
            request.scale,
            request.rotation,
        );

        for (corner, uv) in corners.iter().zip(request.tex_coords.0.iter()) {
            self.vertices.push(Vertex {
                position: [corner.x, corner.y, z],
                color,
                tex_coords: [uv.x, uv.y],
                tex_slot,
                shape_kind: request.kind.gpu_id(),
                normalized,
            });
        }

        self.count += 1;
    }

    /// Creates the batch's GPU objects. Later calls are no-ops.
    pub fn start<B>(&mut self, backend: &mut B)
    where
        B: BatchBackend<Buffers = G>,
    {
        if self.gpu.is_some() {
            return;
        }
        let indices = generate_indices(self.max_shapes);
        self.gpu = Some(backend.create_buffers(self.family, self.max_shapes, &indices));
        self.state = BatchState::Started;
    }

    /// Uploads the live vertices and issues one draw call for `len() * 6`
    /// indices. Does nothing before [`start`](Self::start) or when empty.
    ///
    /// Returns whether the backend issued the draw.
    pub fn render<B>(&mut self, backend: &mut B, uniforms: BatchUniforms, viewport: Viewport) -> bool
    where
        B: BatchBackend<Buffers = G>,
    {
        let Some(gpu) = self.gpu.as_mut() else {
            log::debug!("render called on a batch that was never started; skipped");
            return false;
        };

        let mut drawn = false;
        if self.count > 0 {
            let draw = BatchDraw {
                family: self.family,
                z_index: self.z_index,
                vertices: &self.vertices,
                index_count: (self.count * INDICES_PER_SHAPE) as u32,
                textures: self.slots.textures(),
                uniforms,
                viewport,
            };
            drawn = backend.draw(gpu, &draw);
        }

        self.state = BatchState::Presented;
        drawn
    }
}
