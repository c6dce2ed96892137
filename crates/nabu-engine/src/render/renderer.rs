use std::cmp::Reverse;
use std::time::Instant;

use glam::{Vec2, Vec3};
use thiserror::Error;

use super::backend::{BatchBackend, BatchUniforms};
use super::batch::RenderBatch;
use super::camera::Camera;
use super::slots::MAX_TEXTURE_SLOTS;
use super::sprite::Sprite;
use super::vertex::VERTICES_PER_SHAPE;
use super::wgpu_backend::WgpuBatchBuffers;
use super::{DrawRequest, ShapeKind, TexCoords, TextureHandle};
use crate::paint::Color;
use crate::text::{FontId, TextSystem};

/// Renderer construction parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererConfig {
    /// Shapes per batch.
    pub max_batch_size: usize,
    /// Textures one batch may bind.
    pub texture_slots: usize,
    pub clear_color: Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            texture_slots: 8,
            clear_color: Color::CHARCOAL,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RendererConfigError {
    #[error("max_batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("max_batch_size {0} needs more vertices than a u32 index can address")]
    BatchTooLarge(usize),
    #[error("texture_slots must be in 1..={max}, got {got}")]
    TextureSlots { got: usize, max: usize },
}

impl RendererConfig {
    pub fn validate(&self) -> Result<(), RendererConfigError> {
        if self.max_batch_size == 0 {
            return Err(RendererConfigError::ZeroBatchSize);
        }
        let vertices = self.max_batch_size.checked_mul(VERTICES_PER_SHAPE);
        if vertices.is_none_or(|v| v > u32::MAX as usize) {
            return Err(RendererConfigError::BatchTooLarge(self.max_batch_size));
        }
        if self.texture_slots == 0 || self.texture_slots > MAX_TEXTURE_SLOTS {
            return Err(RendererConfigError::TextureSlots {
                got: self.texture_slots,
                max: MAX_TEXTURE_SLOTS,
            });
        }
        Ok(())
    }

    /// Lowers `texture_slots` to what the device can sample per draw.
    pub fn clamp_to_device(mut self, device_slots: usize) -> Self {
        self.texture_slots = self.texture_slots.min(device_slots.max(1));
        self
    }
}

/// Counters for the most recent flush. `draw_calls` counts draws the
/// backend actually issued.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub batches: usize,
    pub shapes: usize,
    pub draw_calls: usize,
}

/// Batched 2D renderer.
///
/// Draw calls are collected into batches during the frame and emitted by
/// [`flush`](Self::flush). A shape joins the first batch (in creation order)
/// with the same family and z-index, room to spare, and its texture resident
/// or a slot free; otherwise a new batch is opened. Batches are drawn from the
/// highest z-index to the lowest and dropped after the flush.
pub struct Renderer<G = WgpuBatchBuffers> {
    config: RendererConfig,
    batches: Vec<RenderBatch<G>>,
    created_at: Instant,
    last_stats: FrameStats,
}

impl<G> Renderer<G> {
    pub fn new(config: RendererConfig) -> Result<Self, RendererConfigError> {
        config.validate()?;
        log::debug!(
            "renderer: max_batch_size={} texture_slots={}",
            config.max_batch_size,
            config.texture_slots
        );
        Ok(Self {
            config,
            batches: Vec::new(),
            created_at: Instant::now(),
            last_stats: FrameStats::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    /// Batches collected since the last flush, in creation order.
    #[inline]
    pub fn batches(&self) -> &[RenderBatch<G>] {
        &self.batches
    }

    /// Counters of the last flush.
    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Places one shape into a batch.
    pub fn submit(&mut self, request: DrawRequest) {
        let index = match self.batches.iter().position(|b| b.can_accept(&request)) {
            Some(i) => i,
            None => {
                log::trace!(
                    "new {:?} batch #{} at z={}",
                    request.kind.family(),
                    self.batches.len(),
                    request.z_index()
                );
                self.batches.push(RenderBatch::new(
                    request.kind.family(),
                    request.z_index(),
                    self.config.max_batch_size,
                    self.config.texture_slots,
                ));
                self.batches.len() - 1
            }
        };
        self.batches[index].add_shape(&request);
    }

    pub fn draw_quad(&mut self, position: Vec3, scale: Vec2, color: Color) {
        self.submit(DrawRequest::quad(position, scale, color));
    }

    /// `rotation` is in degrees, clockwise.
    pub fn draw_rotated_quad(&mut self, position: Vec3, scale: Vec2, rotation: f32, color: Color) {
        self.submit(DrawRequest::quad(position, scale, color).with_rotation(rotation));
    }

    /// Quad in normalized screen space (`[0, 1]`, bottom-left origin). The
    /// camera does not apply.
    pub fn draw_normalized_quad(&mut self, position: Vec3, scale: Vec2, color: Color) {
        self.submit(DrawRequest::quad(position, scale, color).normalized(true));
    }

    /// Filled circle with the given radius.
    pub fn draw_circle(&mut self, position: Vec3, radius: f32, color: Color) {
        self.submit(
            DrawRequest::quad(position, Vec2::splat(radius * 2.0), color).with_kind(ShapeKind::Circle),
        );
    }

    /// Textured quad; `color` tints the sprite.
    pub fn draw_sprite(
        &mut self,
        position: Vec3,
        scale: Vec2,
        rotation: f32,
        color: Color,
        sprite: &Sprite,
    ) {
        self.submit(
            DrawRequest::quad(position, scale, color)
                .with_rotation(rotation)
                .with_texture(sprite.texture().cloned(), sprite.tex_coords()),
        );
    }

    /// One glyph quad sampled from a coverage atlas.
    pub fn draw_glyph(
        &mut self,
        position: Vec3,
        scale: Vec2,
        color: Color,
        atlas: &TextureHandle,
        tex_coords: TexCoords,
    ) {
        self.submit(
            DrawRequest::quad(position, scale, color)
                .with_kind(ShapeKind::Text)
                .with_texture(Some(atlas.clone()), tex_coords),
        );
    }

    /// Lays out `content` with its top-left corner at `position` (world
    /// units, one pixel of `size` per unit) and submits one glyph per
    /// visible character.
    pub fn draw_text(
        &mut self,
        text: &mut TextSystem,
        font: FontId,
        content: &str,
        size: f32,
        position: Vec3,
        color: Color,
    ) {
        let atlas = text.atlas_texture().clone();
        for glyph in text.layout(font, content, size, Vec2::new(position.x, position.y)) {
            self.draw_glyph(
                glyph.center.extend(position.z),
                glyph.size,
                color,
                &atlas,
                glyph.tex_coords,
            );
        }
    }

    /// Drops the collected batches without drawing them.
    pub fn discard(&mut self) {
        self.batches.clear();
    }

    /// Draws every collected batch and clears the batch list.
    ///
    /// Order: sort by descending z-index (stable), clear the target, apply the
    /// camera viewport, then start and render each batch.
    pub fn flush<B>(&mut self, backend: &mut B, width: u32, height: u32, camera: &mut Camera)
    where
        B: BatchBackend<Buffers = G>,
    {
        self.batches.sort_by_key(|b| Reverse(b.z_index()));

        let viewport = camera.apply_viewport(width, height);
        backend.clear(self.config.clear_color, viewport);

        let world_projection = camera.projection_matrix();
        let view = camera.view_matrix();
        let time = self.created_at.elapsed().as_secs_f32();

        let mut stats = FrameStats {
            batches: self.batches.len(),
            ..FrameStats::default()
        };

        for batch in &mut self.batches {
            batch.start(backend);
            let uniforms = BatchUniforms {
                world_projection,
                view,
                screen_size: Vec2::new(viewport.width, viewport.height),
                time,
                texture_slots: BatchUniforms::slot_table(batch.textures().len()),
            };
            let drawn = batch.render(backend, uniforms, viewport);

            stats.shapes += batch.len();
            if drawn {
                stats.draw_calls += 1;
            }
        }

        self.batches.clear();
        self.last_stats = stats;
        log::trace!(
            "flush: {} batches, {} shapes, {} draw calls",
            stats.batches,
            stats.shapes,
            stats.draw_calls
        );

        if let Some(err) = backend.finish() {
            log::error!("GPU error during flush: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{RecordedCall, RecordingBackend, RecordingBuffers};
    use crate::render::{BatchState, ShapeFamily, Texture};

    type TestRenderer = Renderer<RecordingBuffers>;

    fn renderer(max_batch_size: usize, texture_slots: usize) -> TestRenderer {
        Renderer::new(RendererConfig {
            max_batch_size,
            texture_slots,
            ..RendererConfig::default()
        })
        .expect("valid config")
    }

    fn at(z: f32) -> Vec3 {
        Vec3::new(10.0, 10.0, z)
    }

    fn flush(r: &mut TestRenderer) -> RecordingBackend {
        let mut backend = RecordingBackend::default();
        let mut camera = Camera::default();
        r.flush(&mut backend, 800, 600, &mut camera);
        backend
    }

    #[test]
    fn config_validation() {
        assert!(RendererConfig::default().validate().is_ok());
        let bad = RendererConfig { max_batch_size: 0, ..Default::default() };
        assert_eq!(bad.validate(), Err(RendererConfigError::ZeroBatchSize));
        let bad = RendererConfig { texture_slots: 17, ..Default::default() };
        assert!(matches!(bad.validate(), Err(RendererConfigError::TextureSlots { got: 17, .. })));
        let bad = RendererConfig { texture_slots: 0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = RendererConfig { max_batch_size: usize::MAX / 2, ..Default::default() };
        assert!(matches!(bad.validate(), Err(RendererConfigError::BatchTooLarge(_))));
    }

    #[test]
    fn clamp_to_device_lowers_slots() {
        let cfg = RendererConfig::default().clamp_to_device(4);
        assert_eq!(cfg.texture_slots, 4);
        let cfg = RendererConfig::default().clamp_to_device(32);
        assert_eq!(cfg.texture_slots, 8);
    }

    #[test]
    fn batches_are_drawn_highest_z_first() {
        let mut r = renderer(100, 8);
        r.draw_quad(at(2.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(1.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(3.0), Vec2::ONE, Color::WHITE);
        assert_eq!(r.batches().len(), 3);

        let backend = flush(&mut r);
        let order: Vec<i32> = backend.draws().map(|d| d.z_index).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn equal_z_batches_keep_creation_order() {
        let mut r = renderer(1, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(5.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(0.0), Vec2::new(2.0, 2.0), Color::BLACK);

        let backend = flush(&mut r);
        let draws: Vec<_> = backend.draws().collect();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].z_index, 5);
        assert_eq!(draws[1].z_index, 0);
        assert_eq!(draws[2].z_index, 0);
    }

    #[test]
    fn overflow_opens_second_batch_with_same_z() {
        let max = 10;
        let mut r = renderer(max, 8);
        for _ in 0..=max {
            r.draw_quad(at(4.0), Vec2::ONE, Color::WHITE);
        }

        let batches = r.batches();
        assert_eq!(batches.len(), 2);
        assert!(batches[0].is_full());
        assert_eq!(batches[0].len(), max);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1].z_index(), 4);
    }

    #[test]
    fn first_fit_reuses_earlier_batch_with_room() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(1.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        assert_eq!(r.batches().len(), 2);
        assert_eq!(r.batches()[0].len(), 2);
    }

    #[test]
    fn texture_slot_exhaustion_opens_new_batch() {
        let mut r = renderer(100, 8);
        let textures: Vec<_> = (0..9).map(|i| Texture::detached(format!("t{i}"), 4, 4)).collect();
        for tex in &textures {
            r.draw_sprite(at(0.0), Vec2::ONE, 0.0, Color::WHITE, &Sprite::new(tex.clone()));
        }

        let batches = r.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].textures().len(), 8);
        assert_eq!(batches[1].textures().len(), 1);
        assert!(batches[1].has_texture(&textures[8]));
    }

    #[test]
    fn resident_texture_fits_full_slot_table() {
        let mut r = renderer(100, 2);
        let a = Texture::detached("a", 1, 1);
        let b = Texture::detached("b", 1, 1);
        for tex in [&a, &b, &a, &b] {
            r.draw_sprite(at(0.0), Vec2::ONE, 0.0, Color::WHITE, &Sprite::new(tex.clone()));
        }
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        assert_eq!(r.batches().len(), 1);
        assert_eq!(r.batches()[0].len(), 5);
    }

    #[test]
    fn text_and_shapes_never_share_a_batch() {
        let mut r = renderer(100, 8);
        let atlas = Texture::detached("atlas", 64, 64);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        r.draw_glyph(at(0.0), Vec2::ONE, Color::WHITE, &atlas, TexCoords::FULL);
        r.draw_circle(at(0.0), 3.0, Color::WHITE);

        let families: Vec<_> = r.batches().iter().map(|b| b.family()).collect();
        assert_eq!(families, vec![ShapeFamily::Shapes, ShapeFamily::Glyphs]);
        assert_eq!(r.batches()[0].len(), 2);
    }

    #[test]
    fn every_batch_holds_a_single_z() {
        let mut r = renderer(3, 8);
        let zs = [0.0, 2.0, 1.0, 2.0, 0.0, 0.0, 0.0, 1.5, 2.9];
        for z in zs {
            r.draw_quad(at(z), Vec2::ONE, Color::WHITE);
        }
        for batch in r.batches() {
            assert!(batch.len() <= batch.max_shapes());
            assert!(batch.vertices().iter().all(|v| v.position[2] == batch.z_index() as f32));
        }
        let total: usize = r.batches().iter().map(|b| b.len()).sum();
        assert_eq!(total, zs.len());
    }

    #[test]
    fn flush_sequence_and_cleanup() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(1.0), Vec2::ONE, Color::WHITE);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);

        let backend = flush(&mut r);
        assert!(matches!(backend.calls.first(), Some(RecordedCall::Clear { .. })));
        assert!(matches!(backend.calls.last(), Some(RecordedCall::Finish)));
        assert!(r.batches().is_empty());
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(r.stats(), FrameStats { batches: 2, shapes: 2, draw_calls: 2 });
    }

    #[test]
    fn flush_uses_full_window_viewport() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        let backend = flush(&mut r);
        let draw = backend.draws().next().expect("draw");
        assert_eq!(draw.viewport.width, 800.0);
        assert_eq!(draw.viewport.height, 600.0);
        assert_eq!(draw.uniforms.screen_size, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn empty_flush_only_clears() {
        let mut r = renderer(10, 8);
        let backend = flush(&mut r);
        assert_eq!(backend.calls.len(), 2);
        assert_eq!(r.stats(), FrameStats::default());

        let again = flush(&mut r);
        assert_eq!(again.calls, backend.calls);
    }

    #[test]
    fn discard_drops_batches_without_drawing() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        r.discard();
        let backend = flush(&mut r);
        assert_eq!(backend.draws().count(), 0);
    }

    #[test]
    fn gpu_errors_do_not_abort_flush() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        let mut backend = RecordingBackend::default();
        backend.fail_with = Some("validation".into());
        r.flush(&mut backend, 100, 100, &mut Camera::default());
        assert_eq!(backend.draws().count(), 1);
        assert!(backend.fail_with.is_none());
        assert!(r.batches().is_empty());
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn submit_after_flush_opens_a_fresh_batch() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        flush(&mut r);
        assert!(r.batches().is_empty());

        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        assert_eq!(r.batches().len(), 1);
        assert_eq!(r.batches()[0].len(), 1);
        assert_eq!(r.batches()[0].state(), BatchState::Building);

        let backend = flush(&mut r);
        assert_eq!(backend.draws().count(), 1);
    }

    #[test]
    fn skipped_draws_are_not_counted() {
        let mut r = renderer(10, 8);
        r.draw_quad(at(0.0), Vec2::ONE, Color::WHITE);
        let mut backend = RecordingBackend::default();
        backend.skip_draws = true;
        r.flush(&mut backend, 800, 600, &mut Camera::default());
        assert_eq!(r.stats(), FrameStats { batches: 1, shapes: 1, draw_calls: 0 });
    }

    #[test]
    fn slot_table_follows_bound_textures() {
        let mut r = renderer(10, 8);
        let tex = Texture::detached("t", 2, 2);
        r.draw_sprite(at(0.0), Vec2::ONE, 0.0, Color::WHITE, &Sprite::new(tex));
        let backend = flush(&mut r);
        let draw = backend.draws().next().expect("draw");
        assert_eq!(draw.textures.len(), 1);
        assert_eq!(&draw.uniforms.texture_slots[..2], &[1, 0]);
    }
}
