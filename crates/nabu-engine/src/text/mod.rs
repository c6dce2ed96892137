//! Font loading, glyph rasterization and text layout.
//!
//! [`TextSystem`] lays strings out in world space and packs the glyphs it
//! needs into a [`GlyphAtlas`]; the renderer draws each glyph as a textured
//! quad in the glyph batch family.

mod font_system;
mod glyph_atlas;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use glam::Vec2;

use crate::render::{TexCoords, TextureHandle};

pub use font_system::{FontId, FontSystem};
pub use glyph_atlas::{AtlasGlyph, GlyphAtlas, ATLAS_SIZE};

/// One glyph quad ready to submit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph {
    /// Quad center in world units.
    pub center: Vec2,
    pub size: Vec2,
    pub tex_coords: TexCoords,
}

/// Fonts plus the atlas their glyphs are rasterized into.
pub struct TextSystem {
    pub fonts: FontSystem,
    atlas: GlyphAtlas,
    layout: Layout<()>,
}

impl TextSystem {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::with_atlas(FontSystem::new(), GlyphAtlas::new(device, queue))
    }

    pub fn with_atlas(fonts: FontSystem, atlas: GlyphAtlas) -> Self {
        Self {
            fonts,
            atlas,
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    #[inline]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    #[inline]
    pub fn atlas_texture(&self) -> &TextureHandle {
        self.atlas.texture()
    }

    /// Flushes newly rasterized glyphs to the GPU. Call once per frame
    /// before the renderer flushes.
    pub fn upload_pending(&mut self, queue: &wgpu::Queue) {
        self.atlas.upload_pending(queue);
    }

    /// Lays `content` out on a single line with its top-left corner at
    /// `top_left` (world units, +Y up). Glyphs missing from the atlas are
    /// rasterized; blank glyphs and glyphs that no longer fit are skipped.
    pub fn layout(&mut self, font: FontId, content: &str, size: f32, top_left: Vec2) -> Vec<PlacedGlyph> {
        let Some(face) = self.fonts.get(font) else {
            log::warn!("draw_text with unknown font {font:?}");
            return Vec::new();
        };

        self.layout.reset(&LayoutSettings::default());
        self.layout.append(&[face], &TextStyle::new(content, size, 0));

        let mut placed = Vec::with_capacity(self.layout.glyphs().len());
        for g in self.layout.glyphs() {
            if g.width == 0 || g.height == 0 {
                continue;
            }
            let glyph = match self.atlas.get(&g.key) {
                Some(glyph) => glyph,
                None => {
                    let (metrics, bitmap) = face.rasterize_config(g.key);
                    let Some(glyph) =
                        self.atlas.insert(g.key, metrics.width as u32, metrics.height as u32, bitmap)
                    else {
                        continue;
                    };
                    glyph
                }
            };

            let size = Vec2::new(g.width as f32, g.height as f32);
            let center = Vec2::new(
                top_left.x + g.x + size.x * 0.5,
                top_left.y - g.y - size.y * 0.5,
            );
            placed.push(PlacedGlyph {
                center,
                size,
                tex_coords: glyph.tex_coords,
            });
        }
        placed
    }
}
