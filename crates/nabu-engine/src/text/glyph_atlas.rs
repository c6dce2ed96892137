use std::collections::HashMap;

use fontdue::layout::GlyphRasterConfig;
use glam::Vec2;

use crate::render::{TexCoords, Texture, TextureHandle};

pub const ATLAS_SIZE: u32 = 2048;
const GLYPH_PADDING: u32 = 1;

/// Location of a rasterized glyph inside the atlas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AtlasGlyph {
    pub tex_coords: TexCoords,
    /// Bitmap size in pixels.
    pub size: Vec2,
}

struct PendingUpload {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    bitmap: Vec<u8>,
}

/// Shelf-packed R8 coverage atlas.
///
/// Glyphs are packed left to right in rows; a glyph that does not fit the
/// current row starts a new one below the tallest glyph of the row. Once a
/// glyph does not fit vertically the atlas is marked full and further glyphs
/// are dropped.
///
/// Bitmaps are queued on insert and written to the GPU by
/// [`upload_pending`](Self::upload_pending).
pub struct GlyphAtlas {
    texture: TextureHandle,
    size: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
    glyphs: HashMap<GlyphRasterConfig, AtlasGlyph>,
    pending: Vec<PendingUpload>,
}

impl GlyphAtlas {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let blank = vec![0u8; (ATLAS_SIZE * ATLAS_SIZE) as usize];
        let texture = Texture::from_r8(device, queue, "nabu glyph atlas", ATLAS_SIZE, ATLAS_SIZE, &blank);
        Self::with_texture(texture)
    }

    /// Atlas without GPU storage; uploads are discarded.
    pub fn detached(size: u32) -> Self {
        Self::with_texture(Texture::detached("nabu glyph atlas", size, size))
    }

    fn with_texture(texture: TextureHandle) -> Self {
        Self {
            size: texture.width().min(texture.height()),
            texture,
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            glyphs: HashMap::new(),
            pending: Vec::new(),
        }
    }

    #[inline]
    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    #[inline]
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    pub fn get(&self, key: &GlyphRasterConfig) -> Option<AtlasGlyph> {
        self.glyphs.get(key).copied()
    }

    /// Packs a `width` x `height` coverage bitmap. Returns `None` when the
    /// atlas has no room left.
    pub fn insert(
        &mut self,
        key: GlyphRasterConfig,
        width: u32,
        height: u32,
        bitmap: Vec<u8>,
    ) -> Option<AtlasGlyph> {
        if let Some(glyph) = self.get(&key) {
            return Some(glyph);
        }
        let (x, y) = self.allocate(width, height)?;

        let atlas = self.size as f32;
        let glyph = AtlasGlyph {
            tex_coords: TexCoords::from_min_max(
                Vec2::new(x as f32, y as f32) / atlas,
                Vec2::new((x + width) as f32, (y + height) as f32) / atlas,
            ),
            size: Vec2::new(width as f32, height as f32),
        };
        self.glyphs.insert(key, glyph);
        self.pending.push(PendingUpload { x, y, width, height, bitmap });
        Some(glyph)
    }

    fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.full {
            return None;
        }
        if width + 2 * GLYPH_PADDING > self.size || height + 2 * GLYPH_PADDING > self.size {
            log::warn!("glyph {width}x{height} cannot fit a {0}x{0} atlas; skipped", self.size);
            return None;
        }

        if self.cursor_x + width + GLYPH_PADDING > self.size {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }

        if self.cursor_y + height + GLYPH_PADDING > self.size
            || self.cursor_x + width + GLYPH_PADDING > self.size
        {
            log::warn!(
                "glyph atlas is full ({0}x{0}); further glyphs will not be drawn",
                self.size
            );
            self.full = true;
            return None;
        }

        let at = (self.cursor_x, self.cursor_y);
        self.cursor_x += width + GLYPH_PADDING;
        self.row_height = self.row_height.max(height);
        Some(at)
    }

    /// Writes queued glyph bitmaps into the atlas texture.
    pub fn upload_pending(&mut self, queue: &wgpu::Queue) {
        let pending = std::mem::take(&mut self.pending);
        let Some(gpu) = self.texture.gpu() else { return };

        for glyph in pending {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: glyph.x, y: glyph.y, z: 0 },
                    aspect: wgpu::TextureAspect::All,
                },
                &glyph.bitmap,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(glyph.width),
                    rows_per_image: Some(glyph.height),
                },
                wgpu::Extent3d {
                    width: glyph.width,
                    height: glyph.height,
                    depth_or_array_layers: 1,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: u16) -> GlyphRasterConfig {
        GlyphRasterConfig { glyph_index: i, px: 16.0, font_hash: 7 }
    }

    #[test]
    fn glyphs_are_cached_by_key() {
        let mut atlas = GlyphAtlas::detached(64);
        let a = atlas.insert(key(1), 4, 4, vec![255; 16]).expect("fits");
        let b = atlas.insert(key(1), 4, 4, vec![255; 16]).expect("cached");
        assert_eq!(a, b);
        assert_eq!(atlas.len(), 1);
        assert_eq!(atlas.pending_uploads(), 1);
    }

    #[test]
    fn shelf_wraps_to_next_row() {
        let mut atlas = GlyphAtlas::detached(16);
        let first = atlas.insert(key(1), 6, 3, vec![0; 18]).expect("fits");
        atlas.insert(key(2), 6, 5, vec![0; 30]).expect("fits");
        let third = atlas.insert(key(3), 6, 2, vec![0; 12]).expect("wraps");

        // Top-left UV is the last corner.
        assert_eq!(first.tex_coords.0[3], Vec2::new(1.0, 1.0) / 16.0);
        assert_eq!(third.tex_coords.0[3], Vec2::new(1.0, 7.0) / 16.0);
    }

    #[test]
    fn full_atlas_rejects_glyphs() {
        let mut atlas = GlyphAtlas::detached(8);
        assert!(atlas.insert(key(1), 6, 6, vec![0; 36]).is_some());
        assert!(atlas.insert(key(2), 6, 6, vec![0; 36]).is_none());
        assert!(atlas.is_full());
        assert!(atlas.insert(key(3), 1, 1, vec![0]).is_none());
    }

    #[test]
    fn oversized_glyph_leaves_atlas_usable() {
        let mut atlas = GlyphAtlas::detached(64);
        assert!(atlas.insert(key(1), 100, 10, vec![0; 1000]).is_none());
        assert!(!atlas.is_full());
        assert!(atlas.insert(key(2), 4, 4, vec![0; 16]).is_some());
        assert_eq!(atlas.len(), 1);
    }
}
