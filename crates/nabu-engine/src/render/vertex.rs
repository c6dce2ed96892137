//! GPU vertex layout and static quad topology shared by all batches.

use bytemuck::{Pod, Zeroable};
use glam::{Mat2, Vec2};

/// Vertices emitted per shape.
pub const VERTICES_PER_SHAPE: usize = 4;

/// Indices emitted per shape (two triangles).
pub const INDICES_PER_SHAPE: usize = 6;

/// Per-quad index pattern, relative to the quad's first vertex.
///
/// ```text
/// 3 ---- 0
/// |      |
/// 2 ---- 1
/// ```
pub const QUAD_INDEX_PATTERN: [u32; INDICES_PER_SHAPE] = [3, 2, 0, 0, 2, 1];

/// Batch vertex (48 bytes).
///
///  offset  0  position    [f32; 3]  loc 0  (z = batch z-index)
///  offset 12  color       [f32; 4]  loc 1
///  offset 28  tex_coords  [f32; 2]  loc 2
///  offset 36  tex_slot    f32       loc 3  (0 = untextured)
///  offset 40  shape_kind  u32       loc 4
///  offset 44  normalized  f32       loc 5
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
    pub tex_slot: f32,
    pub shape_kind: u32,
    pub normalized: f32,
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4, // color
        2 => Float32x2, // tex_coords
        3 => Float32,   // tex_slot
        4 => Uint32,    // shape_kind
        5 => Float32    // normalized
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Builds the static index list for `capacity` shapes.
///
/// Computed once per batch, independent of how many shapes end up in it.
pub fn generate_indices(capacity: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(capacity * INDICES_PER_SHAPE);
    for shape in 0..capacity {
        let base = (shape * VERTICES_PER_SHAPE) as u32;
        indices.extend(QUAD_INDEX_PATTERN.iter().map(|&i| base + i));
    }
    indices
}

/// Corner positions of a `scale`-sized shape centered on `center`, rotated
/// clockwise by `rotation_deg`, in vertex order (TR, BR, BL, TL).
pub fn quad_corners(center: Vec2, scale: Vec2, rotation_deg: f32) -> [Vec2; VERTICES_PER_SHAPE] {
    let half = scale * 0.5;
    let offsets = [
        Vec2::new(half.x, half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(-half.x, -half.y),
        Vec2::new(-half.x, half.y),
    ];

    if rotation_deg == 0.0 {
        return offsets.map(|o| center + o);
    }

    let rotation = Mat2::from_angle(-rotation_deg.to_radians());
    offsets.map(|o| center + rotation * o)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn vertex_is_48_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
    }

    #[test]
    fn indices_cover_full_capacity() {
        let indices = generate_indices(3);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[..6], &[3, 2, 0, 0, 2, 1]);
        assert_eq!(&indices[12..], &[11, 10, 8, 8, 10, 9]);
    }

    #[test]
    fn zero_capacity_has_no_indices() {
        assert!(generate_indices(0).is_empty());
    }

    #[test]
    fn unrotated_corners_wind_tr_br_bl_tl() {
        let c = quad_corners(Vec2::new(10.0, 20.0), Vec2::new(4.0, 2.0), 0.0);
        assert_eq!(c[0], Vec2::new(12.0, 21.0));
        assert_eq!(c[1], Vec2::new(12.0, 19.0));
        assert_eq!(c[2], Vec2::new(8.0, 19.0));
        assert_eq!(c[3], Vec2::new(8.0, 21.0));
    }

    #[test]
    fn quarter_turn_rotates_clockwise() {
        let c = quad_corners(Vec2::ZERO, Vec2::new(2.0, 2.0), 90.0);
        // Top-right (1, 1) rotated by +90° lands on the bottom-right (1, -1).
        assert!(approx(c[0], Vec2::new(1.0, -1.0)));
        assert!(approx(c[2], Vec2::new(-1.0, 1.0)));
        let back = quad_corners(Vec2::ZERO, Vec2::new(2.0, 2.0), -90.0);
        assert!(approx(back[0], Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn rotation_preserves_center() {
        let center = Vec2::new(5.0, -3.0);
        let c = quad_corners(center, Vec2::new(7.0, 3.0), 33.0);
        let mean = (c[0] + c[1] + c[2] + c[3]) / 4.0;
        assert!(approx(mean, center));
    }
}
