use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared texture reference.
///
/// Batches hold clones of the handle for the frame they are built in; the
/// asset cache owns the long-lived copy. Identity (not pixel content)
/// decides whether two handles name the same texture.
pub type TextureHandle = Rc<Texture>;

/// Process-unique texture identifier, used for logging and test assertions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// GPU-resident part of a texture.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// A 2D texture the batches can sample.
///
/// Pixel decoding happens before a `Texture` exists; this type only knows
/// its size and (optionally) its GPU residency. A texture without a GPU part
/// still takes a slot and renders as the fallback white texture.
pub struct Texture {
    id: TextureId,
    label: String,
    width: u32,
    height: u32,
    gpu: Option<GpuTexture>,
}

impl Texture {
    /// Creates a texture that has no GPU residency.
    pub fn detached(label: impl Into<String>, width: u32, height: u32) -> TextureHandle {
        Rc::new(Self {
            id: TextureId::next(),
            label: label.into(),
            width,
            height,
            gpu: None,
        })
    }

    /// Uploads tightly packed RGBA8 (sRGB) pixels and returns a shared handle.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: impl Into<String>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> TextureHandle {
        Self::upload(
            device,
            queue,
            label.into(),
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            4,
            pixels,
        )
    }

    /// Uploads tightly packed single-channel pixels (coverage masks).
    pub fn from_r8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: impl Into<String>,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> TextureHandle {
        Self::upload(
            device,
            queue,
            label.into(),
            width,
            height,
            wgpu::TextureFormat::R8Unorm,
            1,
            pixels,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: String,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        bytes_per_pixel: u32,
        pixels: &[u8],
    ) -> TextureHandle {
        let width = width.max(1);
        let height = height.max(1);
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let expected = (width * height * bytes_per_pixel) as usize;
        if pixels.len() >= expected {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &pixels[..expected],
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width * bytes_per_pixel),
                    rows_per_image: Some(height),
                },
                size,
            );
        } else {
            log::error!(
                "texture `{label}`: expected {expected} bytes of pixel data, got {}; left blank",
                pixels.len()
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Rc::new(Self {
            id: TextureId::next(),
            label,
            width,
            height,
            gpu: Some(GpuTexture { texture, view }),
        })
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// GPU view to bind, `None` for detached textures.
    #[inline]
    pub fn gpu(&self) -> Option<&GpuTexture> {
        self.gpu.as_ref()
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("resident", &self.gpu.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_textures_get_unique_ids() {
        let a = Texture::detached("a", 16, 16);
        let b = Texture::detached("a", 16, 16);
        assert_ne!(a.id(), b.id());
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn detached_texture_reports_size_without_gpu() {
        let t = Texture::detached("sheet", 128, 64);
        assert_eq!((t.width(), t.height()), (128, 64));
        assert!(t.gpu().is_none());
    }
}
