use glam::{Vec2, Vec3};

use crate::paint::Color;

use super::TextureHandle;

/// Kind of shape a request draws. Stored per vertex so one shader can
/// shade several kinds inside a single batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    Quad,
    Circle,
    Text,
}

/// Shape family a batch is dedicated to.
///
/// Every family has its own pipeline; shapes of different families never
/// share a batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeFamily {
    /// Quads and circles (color and/or sampled RGBA texture).
    Shapes,
    /// Text glyphs (coverage sampled from an R8 glyph atlas).
    Glyphs,
}

impl ShapeKind {
    #[inline]
    pub const fn family(self) -> ShapeFamily {
        match self {
            ShapeKind::Quad | ShapeKind::Circle => ShapeFamily::Shapes,
            ShapeKind::Text => ShapeFamily::Glyphs,
        }
    }

    /// Value written to the vertex `shape_kind` attribute.
    #[inline]
    pub const fn gpu_id(self) -> u32 {
        match self {
            ShapeKind::Quad => 0,
            ShapeKind::Circle => 1,
            ShapeKind::Text => 2,
        }
    }
}

/// Texture coordinates for the four corners of a shape, in vertex order:
/// top-right, bottom-right, bottom-left, top-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexCoords(pub [Vec2; 4]);

impl TexCoords {
    /// The whole texture, upright.
    pub const FULL: TexCoords = TexCoords([
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(0.0, 0.0),
    ]);

    /// Coordinates covering the `[min, max]` UV rectangle (texture space,
    /// `min` is the top-left corner).
    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        TexCoords([
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
            Vec2::new(min.x, min.y),
        ])
    }
}

impl Default for TexCoords {
    fn default() -> Self {
        Self::FULL
    }
}

/// One drawable unit.
///
/// `position.xy` is the shape's center; `position.z` is its z-index and only
/// selects the batch (draw order), it is never depth-tested.
#[derive(Debug, Clone)]
pub struct DrawRequest {
    pub position: Vec3,
    pub scale: Vec2,
    /// Rotation in degrees, clockwise.
    pub rotation: f32,
    pub kind: ShapeKind,
    pub color: Color,
    pub texture: Option<TextureHandle>,
    pub tex_coords: TexCoords,
    /// Screen-space (`[0, 1]` viewport) instead of world-space coordinates.
    pub normalized: bool,
}

impl DrawRequest {
    /// An untextured, unrotated world-space quad.
    pub fn quad(position: Vec3, scale: Vec2, color: Color) -> Self {
        Self {
            position,
            scale,
            rotation: 0.0,
            kind: ShapeKind::Quad,
            color,
            texture: None,
            tex_coords: TexCoords::FULL,
            normalized: false,
        }
    }

    #[inline]
    pub fn with_kind(mut self, kind: ShapeKind) -> Self {
        self.kind = kind;
        self
    }

    #[inline]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    #[inline]
    pub fn with_texture(mut self, texture: Option<TextureHandle>, tex_coords: TexCoords) -> Self {
        self.texture = texture;
        self.tex_coords = tex_coords;
        self
    }

    #[inline]
    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Integer z-index used for batch partitioning.
    ///
    /// Fractional z values are truncated toward zero.
    #[inline]
    pub fn z_index(&self) -> i32 {
        self.position.z as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_and_circle_share_a_family() {
        assert_eq!(ShapeKind::Quad.family(), ShapeKind::Circle.family());
        assert_ne!(ShapeKind::Quad.family(), ShapeKind::Text.family());
    }

    #[test]
    fn from_min_max_winds_like_full() {
        assert_eq!(TexCoords::from_min_max(Vec2::ZERO, Vec2::ONE), TexCoords::FULL);
    }

    #[test]
    fn z_index_truncates() {
        let r = DrawRequest::quad(Vec3::new(0.0, 0.0, 2.9), Vec2::ONE, Color::WHITE);
        assert_eq!(r.z_index(), 2);
    }
}
