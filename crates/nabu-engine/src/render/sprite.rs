use std::collections::HashMap;

use glam::Vec2;

use super::{TexCoords, TextureHandle};
use crate::assets::AssetError;
use crate::coords::Rect;

/// A texture region, or no texture at all (a plain colored quad).
#[derive(Debug, Clone)]
pub struct Sprite {
    texture: Option<TextureHandle>,
    tex_coords: TexCoords,
}

impl Sprite {
    /// The whole texture.
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture: Some(texture),
            tex_coords: TexCoords::FULL,
        }
    }

    /// Untextured sprite; draws with the tint color only.
    pub fn solid() -> Self {
        Self {
            texture: None,
            tex_coords: TexCoords::FULL,
        }
    }

    pub fn with_tex_coords(texture: TextureHandle, tex_coords: TexCoords) -> Self {
        Self {
            texture: Some(texture),
            tex_coords,
        }
    }

    /// Sprite covering `region` (texture pixels, top-left origin).
    pub fn from_region(texture: TextureHandle, region: Rect) -> Self {
        let extent = Vec2::new(texture.width() as f32, texture.height() as f32);
        let uv = region.normalized_to(extent);
        Self::with_tex_coords(texture, TexCoords::from_min_max(uv.min(), uv.max()))
    }

    #[inline]
    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    #[inline]
    pub fn tex_coords(&self) -> TexCoords {
        self.tex_coords
    }
}

/// Uniform grid of sprites cut from one texture.
///
/// Cells are read left to right, top to bottom, starting at the top-left
/// corner; `spacing` pixels separate neighbouring cells on both axes.
#[derive(Debug)]
pub struct SpriteSheet {
    texture: TextureHandle,
    sprites: Vec<Sprite>,
    names: HashMap<String, usize>,
}

impl SpriteSheet {
    pub fn new(
        texture: TextureHandle,
        sprite_width: u32,
        sprite_height: u32,
        count: usize,
        spacing: u32,
    ) -> Self {
        let tex_w = texture.width();
        let tex_h = texture.height();
        let mut sprites = Vec::with_capacity(count);

        if sprite_width > 0 && sprite_height > 0 {
            let mut x = 0u32;
            let mut y = 0u32;
            while sprites.len() < count && y + sprite_height <= tex_h {
                if x + sprite_width > tex_w {
                    x = 0;
                    y += sprite_height + spacing;
                    continue;
                }
                let region = Rect::new(x as f32, y as f32, sprite_width as f32, sprite_height as f32);
                sprites.push(Sprite::from_region(texture.clone(), region));
                x += sprite_width + spacing;
            }
        }

        if sprites.len() < count {
            log::warn!(
                "sprite sheet '{}' holds {} sprites of {}x{}, {} requested",
                texture.label(),
                sprites.len(),
                sprite_width,
                sprite_height,
                count
            );
        }

        Self {
            texture,
            sprites,
            names: HashMap::new(),
        }
    }

    /// Names sprites in order; extra names are ignored.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let len = self.sprites.len();
        for (index, name) in names.into_iter().take(len).enumerate() {
            self.names.insert(name.into(), index);
        }
        self
    }

    #[inline]
    pub fn texture(&self) -> &TextureHandle {
        &self.texture
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Sprite at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    /// Sprite registered under `name`.
    pub fn named(&self, name: &str) -> Result<&Sprite, AssetError> {
        self.names
            .get(name)
            .and_then(|&i| self.sprites.get(i))
            .ok_or_else(|| AssetError::NotFound(format!("sprite '{name}' in '{}'", self.texture.label())))
    }
}
