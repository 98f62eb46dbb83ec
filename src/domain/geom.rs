/// Continuous-space geometry: points, boxes and the small scalar helpers
/// the kinematics and camera share.

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        Vec2::new(lerp(self.x, to.x, t), lerp(self.y, to.y, t))
    }
}

/// Axis-aligned box: top-left corner + size, in world pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Inclusive tile range `(min_tx, min_ty, max_tx, max_ty)` covered by this box.
    pub fn tile_span(&self, tile_size: f32) -> (i32, i32, i32, i32) {
        (
            (self.x / tile_size).floor() as i32,
            (self.y / tile_size).floor() as i32,
            (self.right() / tile_size).floor() as i32,
            (self.bottom() / tile_size).floor() as i32,
        )
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Move `v` toward `target` by at most `delta`, never overshooting.
pub fn approach(v: f32, target: f32, delta: f32) -> f32 {
    if v < target {
        (v + delta).min(target)
    } else if v > target {
        (v - delta).max(target)
    } else {
        target
    }
}

/// Clamp for camera bounds. When the viewport is larger than the world
/// (`max < min`) the camera centers instead of clamping to an inverted range.
pub fn clamp_cam(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        (min + max) * 0.5
    } else {
        value.clamp(min, max)
    }
}

/// Tile coordinate containing a world-pixel point.
pub fn tile_of(p: Vec2, tile_size: f32) -> (i32, i32) {
    ((p.x / tile_size).floor() as i32, (p.y / tile_size).floor() as i32)
}

/// World-pixel center of a tile.
pub fn tile_center(tx: i32, ty: i32, tile_size: f32) -> Vec2 {
    Vec2::new((tx as f32 + 0.5) * tile_size, (ty as f32 + 0.5) * tile_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approach_never_overshoots() {
        assert_eq!(approach(0.0, 10.0, 4.0), 4.0);
        assert_eq!(approach(8.0, 10.0, 4.0), 10.0);
        assert_eq!(approach(-3.0, 0.0, 5.0), 0.0);
        assert_eq!(approach(2.0, 2.0, 1.0), 2.0);
    }

    #[test]
    fn clamp_cam_centers_on_inverted_range() {
        // world 400 wide, viewport 600: max = -200
        assert_eq!(clamp_cam(123.0, 0.0, -200.0), -100.0);
        assert_eq!(clamp_cam(-50.0, 0.0, 300.0), 0.0);
        assert_eq!(clamp_cam(500.0, 0.0, 300.0), 300.0);
    }

    #[test]
    fn tile_span_is_inclusive_of_touching_edge() {
        let b = Aabb { x: 10.0, y: 0.0, w: 38.0, h: 10.0 };
        // right edge exactly at 48 touches tile 1
        assert_eq!(b.tile_span(48.0), (0, 0, 1, 0));
    }

    #[test]
    fn negative_points_floor_to_negative_tiles() {
        assert_eq!(tile_of(Vec2::new(-1.0, 47.9), 48.0), (-1, 0));
        assert_eq!(tile_center(2, 3, 48.0), Vec2::new(120.0, 168.0));
    }
}
