use std::collections::HashMap;
use std::path::Path;

use super::AssetError;
use crate::render::{Texture, TextureHandle};
use crate::text::{FontId, FontSystem};

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decodes an image file (PNG, JPEG, BMP, GIF or TIFF) to RGBA8.
pub fn decode_rgba8(path: impl AsRef<Path>) -> Result<DecodedImage, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.display().to_string(),
        source,
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Textures and fonts keyed by name.
///
/// Lookups come in two flavours: `texture`/`font` return `None` for unknown
/// names, `require_texture`/`require_font` fail with [`AssetError::NotFound`].
#[derive(Default)]
pub struct AssetCache {
    textures: HashMap<String, TextureHandle>,
    fonts: HashMap<String, FontId>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `path` and uploads it under `name`. A name that is already
    /// loaded returns the cached texture without touching the file.
    pub fn load_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, AssetError> {
        if let Some(texture) = self.textures.get(name) {
            return Ok(texture.clone());
        }
        let image = decode_rgba8(&path)?;
        let texture = Texture::from_rgba8(device, queue, name, image.width, image.height, &image.pixels);
        log::info!(
            "loaded texture '{}' ({}x{}) from {}",
            name,
            image.width,
            image.height,
            path.as_ref().display()
        );
        self.textures.insert(name.to_owned(), texture.clone());
        Ok(texture)
    }

    /// Registers an already created texture, replacing any previous entry.
    pub fn insert_texture(&mut self, name: impl Into<String>, texture: TextureHandle) {
        self.textures.insert(name.into(), texture);
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).cloned()
    }

    pub fn require_texture(&self, name: &str) -> Result<TextureHandle, AssetError> {
        self.texture(name)
            .ok_or_else(|| AssetError::NotFound(format!("texture '{name}'")))
    }

    /// Removes `name` from the cache. Batches still holding the texture keep
    /// it alive until they are dropped.
    pub fn unload_texture(&mut self, name: &str) -> Option<TextureHandle> {
        self.textures.remove(name)
    }

    pub fn load_font(
        &mut self,
        fonts: &mut FontSystem,
        name: &str,
        path: impl AsRef<Path>,
    ) -> Result<FontId, AssetError> {
        if let Some(&id) = self.fonts.get(name) {
            return Ok(id);
        }
        let id = fonts.load_font_file(path)?;
        self.fonts.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn font(&self, name: &str) -> Option<FontId> {
        self.fonts.get(name).copied()
    }

    pub fn require_font(&self, name: &str) -> Result<FontId, AssetError> {
        self.font(name)
            .ok_or_else(|| AssetError::NotFound(format!("font '{name}'")))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.fonts.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn lenient_and_strict_texture_lookup() {
        let mut cache = AssetCache::new();
        let tex = Texture::detached("player", 16, 16);
        cache.insert_texture("player", tex.clone());

        assert!(Rc::ptr_eq(&cache.texture("player").expect("cached"), &tex));
        assert!(cache.texture("enemy").is_none());
        assert!(matches!(cache.require_texture("enemy"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn unload_keeps_outstanding_handles_alive() {
        let mut cache = AssetCache::new();
        cache.insert_texture("tiles", Texture::detached("tiles", 8, 8));
        let held = cache.require_texture("tiles").expect("cached");
        assert!(cache.unload_texture("tiles").is_some());
        assert_eq!(cache.texture_count(), 0);
        assert_eq!(held.label(), "tiles");
    }

    #[test]
    fn decoding_missing_file_fails() {
        let err = decode_rgba8("/nonexistent/nabu/missing.png").unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn font_lookup_failures() {
        let mut cache = AssetCache::new();
        let mut fonts = FontSystem::new();
        assert!(cache.load_font(&mut fonts, "ui", "/nonexistent/nabu/ui.ttf").is_err());
        assert!(cache.font("ui").is_none());
        assert!(matches!(cache.require_font("ui"), Err(AssetError::NotFound(_))));
    }
}
