use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::coords::Viewport;

/// Side length of one world tile, in world units.
pub const TILE_SIZE: f32 = 32.0;

/// Default number of tiles visible along each axis.
pub const DEFAULT_TILES: Vec2 = Vec2::new(40.0, 21.0);

const EYE_DISTANCE: f32 = 20.0;
const NEAR: f32 = 0.0;
const FAR: f32 = 100.0;

/// Orthographic 2D camera.
///
/// The visible height is `tiles.y * TILE_SIZE` world units; the visible width
/// follows the viewport aspect ratio. `position` is the world-space point at
/// the bottom-left of the screen.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec2,
    tiles: Vec2,
    projection: Mat4,
    viewport: Viewport,
}

impl Camera {
    pub fn new(position: Vec2) -> Self {
        Self::with_tiles(position, DEFAULT_TILES)
    }

    /// Camera showing `tiles` tiles before any viewport is applied.
    pub fn with_tiles(position: Vec2, tiles: Vec2) -> Self {
        let tiles = tiles.max(Vec2::ONE);
        let viewport = Viewport::new(tiles.x * TILE_SIZE, tiles.y * TILE_SIZE);
        let mut camera = Self {
            position,
            tiles,
            projection: Mat4::IDENTITY,
            viewport,
        };
        camera.adjust_projection();
        camera
    }

    /// Sets the viewport to the full `width` x `height` pixel area and
    /// recomputes the projection for its aspect ratio.
    pub fn apply_viewport(&mut self, width: u32, height: u32) -> Viewport {
        let viewport = Viewport::new(width.max(1) as f32, height.max(1) as f32);
        if viewport != self.viewport {
            log::trace!("camera viewport {}x{}", width, height);
        }
        self.viewport = viewport;
        self.adjust_projection();
        viewport
    }

    fn adjust_projection(&mut self) {
        let size = self.visible_size();
        self.projection = Mat4::orthographic_rh(0.0, size.x, 0.0, size.y, NEAR, FAR);
    }

    /// World-space size of the visible area.
    pub fn visible_size(&self) -> Vec2 {
        let height = self.tiles.y * TILE_SIZE;
        Vec2::new(height * self.viewport.aspect(), height)
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Looks down -Z from in front of the scene.
    pub fn view_matrix(&self) -> Mat4 {
        let eye = Vec3::new(self.position.x, self.position.y, EYE_DISTANCE);
        let center = Vec3::new(self.position.x, self.position.y, -1.0);
        Mat4::look_at_rh(eye, center, Vec3::Y)
    }

    /// Converts a window position (physical pixels, top-left origin) to world
    /// coordinates.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let vp = self.viewport;
        let ndc = Vec2::new(
            (screen.x - vp.x) / vp.width * 2.0 - 1.0,
            1.0 - (screen.y - vp.y) / vp.height * 2.0,
        );
        let inverse = (self.projection * self.view_matrix()).inverse();
        (inverse * ndc.extend(0.0).extend(1.0)).xy()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn visible_height_is_tile_based() {
        let mut cam = Camera::default();
        cam.apply_viewport(1920, 1080);
        let size = cam.visible_size();
        assert_eq!(size.y, 21.0 * TILE_SIZE);
        assert!((size.x - size.y * 1920.0 / 1080.0).abs() < 1e-3);
    }

    #[test]
    fn apply_viewport_covers_full_window() {
        let mut cam = Camera::default();
        let vp = cam.apply_viewport(640, 480);
        assert_eq!(vp, Viewport::new(640.0, 480.0));
        assert_eq!(cam.viewport(), vp);
    }

    #[test]
    fn screen_corners_map_to_visible_area() {
        let mut cam = Camera::new(Vec2::new(100.0, 50.0));
        cam.apply_viewport(800, 600);
        let size = cam.visible_size();

        let bottom_left = cam.screen_to_world(Vec2::new(0.0, 600.0));
        let top_right = cam.screen_to_world(Vec2::new(800.0, 0.0));
        assert!(approx(bottom_left, Vec2::new(100.0, 50.0)));
        assert!(approx(top_right, Vec2::new(100.0, 50.0) + size));
    }

    #[test]
    fn zero_sized_viewport_is_clamped() {
        let mut cam = Camera::default();
        let vp = cam.apply_viewport(0, 0);
        assert!(vp.is_valid());
        assert!(cam.projection_matrix().is_finite());
    }
}
