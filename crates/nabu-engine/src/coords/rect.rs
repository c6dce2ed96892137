use glam::Vec2;

/// Axis-aligned rectangle. Used for sprite regions in texture pixels
/// (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut r = self;
        if r.size.x < 0.0 {
            r.origin.x += r.size.x;
            r.size.x = -r.size.x;
        }
        if r.size.y < 0.0 {
            r.origin.y += r.size.y;
            r.size.y = -r.size.y;
        }
        r
    }

    /// Divides every component by `extent`, mapping pixel space to `[0, 1]`.
    ///
    /// A zero extent component maps that axis to zero.
    #[inline]
    pub fn normalized_to(self, extent: Vec2) -> Self {
        let inv = Vec2::new(
            if extent.x != 0.0 { 1.0 / extent.x } else { 0.0 },
            if extent.y != 0.0 { 1.0 / extent.y } else { 0.0 },
        );
        Self {
            origin: self.origin * inv,
            size: self.size * inv,
        }
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x < r.origin.x + r.size.x
            && p.y < r.origin.y + r.size.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    #[test]
    fn normalized_negative_extent() {
        let n = r(10.0, 10.0, -4.0, -3.0).normalized();
        assert_eq!(n, r(6.0, 7.0, 4.0, 3.0));
    }

    #[test]
    fn normalized_to_maps_pixels_to_unit_space() {
        let uv = r(32.0, 0.0, 32.0, 16.0).normalized_to(Vec2::new(128.0, 64.0));
        assert_eq!(uv, r(0.25, 0.0, 0.25, 0.25));
    }

    #[test]
    fn normalized_to_zero_extent_collapses_axis() {
        let uv = r(4.0, 4.0, 4.0, 4.0).normalized_to(Vec2::new(0.0, 8.0));
        assert_eq!(uv.origin.x, 0.0);
        assert_eq!(uv.origin.y, 0.5);
    }

    #[test]
    fn contains_is_half_open() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(5.0, 5.0)));
        assert!(!rect.contains(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
