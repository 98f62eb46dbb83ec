/// Collision resolver: box-vs-grid overlap and swept movement.
///
/// ## Sweep
///
/// Movement is resolved one axis at a time by the caller (x candidate,
/// then y candidate) so a diagonal push into a wall slides along it.
/// A blocked candidate is binary-searched over `t ∈ [0, 1]` on the
/// segment start → target for the largest `t` whose box is clear.
/// Ten halvings give `1/1024` of the attempted displacement.
///
/// Walkability (`Tile::is_walkable`) is the only tile property consulted.

use super::geom::{Aabb, Vec2};
use super::tile::Tile;

const SWEEP_ITERATIONS: u32 = 10;

/// Read-only view of a tile grid in world space.
pub trait TileGrid {
    /// Tile at integer grid coordinates. Out of range must return a solid tile.
    fn tile_at(&self, tx: i32, ty: i32) -> Tile;
    /// Side length of one tile in world pixels.
    fn tile_size(&self) -> f32;
}

/// Something with a position, a velocity and a box shape that can be
/// evaluated at an arbitrary position.
pub trait Body {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn aabb_at(&self, p: Vec2) -> Aabb;
}

/// Outcome of one sweep.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sweep {
    pub position: Vec2,
    pub velocity: Vec2,
    pub blocked: bool,
}

/// Does the box cover any non-walkable tile?
pub fn overlaps_solid<G: TileGrid + ?Sized>(grid: &G, aabb: &Aabb) -> bool {
    let (min_tx, min_ty, max_tx, max_ty) = aabb.tile_span(grid.tile_size());
    for ty in min_ty..=max_ty {
        for tx in min_tx..=max_tx {
            if !grid.tile_at(tx, ty).is_walkable() {
                return true;
            }
        }
    }
    false
}

/// Move `body` toward `target`, stopping at the farthest clear point.
pub fn sweep<G: TileGrid + ?Sized, B: Body + ?Sized>(grid: &G, body: &B, target: Vec2) -> Sweep {
    let origin = body.position();
    let velocity = body.velocity();

    if target == origin || !overlaps_solid(grid, &body.aabb_at(target)) {
        return Sweep { position: target, velocity, blocked: false };
    }

    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    for _ in 0..SWEEP_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        if overlaps_solid(grid, &body.aabb_at(origin.lerp(target, mid))) {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    // Stop on the dominant axis only.
    let mut velocity = velocity;
    if (target.x - origin.x).abs() > (target.y - origin.y).abs() {
        velocity.x = 0.0;
    } else {
        velocity.y = 0.0;
    }

    Sweep { position: origin.lerp(target, lo), velocity, blocked: true }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Literal grid for tests. Legend as in `Tile::from_legend`.
    pub struct AsciiGrid {
        pub tiles: Vec<Vec<Tile>>,
        pub tile_size: f32,
    }

    impl AsciiGrid {
        pub fn new(rows: &[&str], tile_size: f32) -> Self {
            let tiles = rows
                .iter()
                .map(|row| row.chars().map(|c| Tile::from_legend(c).unwrap_or(Tile::Floor)).collect())
                .collect();
            AsciiGrid { tiles, tile_size }
        }
    }

    impl TileGrid for AsciiGrid {
        fn tile_at(&self, tx: i32, ty: i32) -> Tile {
            if tx < 0 || ty < 0 {
                return Tile::BOUNDARY;
            }
            self.tiles
                .get(ty as usize)
                .and_then(|row| row.get(tx as usize))
                .copied()
                .unwrap_or(Tile::BOUNDARY)
        }

        fn tile_size(&self) -> f32 {
            self.tile_size
        }
    }

    /// Box of fixed size anchored at its top-left corner.
    pub struct Crate {
        pub pos: Vec2,
        pub vel: Vec2,
        pub size: f32,
    }

    impl Body for Crate {
        fn position(&self) -> Vec2 {
            self.pos
        }
        fn velocity(&self) -> Vec2 {
            self.vel
        }
        fn aabb_at(&self, p: Vec2) -> Aabb {
            Aabb { x: p.x, y: p.y, w: self.size, h: self.size }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{AsciiGrid, Crate};
    use super::*;

    fn room() -> AsciiGrid {
        AsciiGrid::new(
            &[
                "######",
                "#....#",
                "#....#",
                "#..#.#",
                "######",
            ],
            10.0,
        )
    }

    #[test]
    fn overlap_detects_walls_and_outside() {
        let g = room();
        assert!(!overlaps_solid(&g, &Aabb { x: 12.0, y: 12.0, w: 5.0, h: 5.0 }));
        assert!(overlaps_solid(&g, &Aabb { x: 5.0, y: 12.0, w: 5.0, h: 5.0 }));
        assert!(overlaps_solid(&g, &Aabb { x: -30.0, y: -30.0, w: 5.0, h: 5.0 }));
        // touching the wall column at x = 50 counts
        assert!(overlaps_solid(&g, &Aabb { x: 45.0, y: 12.0, w: 5.0, h: 5.0 }));
    }

    #[test]
    fn clear_move_is_unmodified() {
        let g = room();
        let c = Crate { pos: Vec2::new(12.0, 12.0), vel: Vec2::new(30.0, 0.0), size: 4.0 };
        let s = sweep(&g, &c, Vec2::new(20.0, 12.0));
        assert_eq!(s.position, Vec2::new(20.0, 12.0));
        assert_eq!(s.velocity, c.vel);
        assert!(!s.blocked);
    }

    #[test]
    fn sweep_to_same_point_changes_nothing() {
        let g = room();
        // Even when wedged inside a wall.
        for pos in [Vec2::new(12.0, 12.0), Vec2::new(2.0, 2.0)] {
            let c = Crate { pos, vel: Vec2::new(7.0, -3.0), size: 4.0 };
            let s = sweep(&g, &c, pos);
            assert_eq!(s.position, pos);
            assert_eq!(s.velocity, Vec2::new(7.0, -3.0));
        }
    }

    #[test]
    fn blocked_move_stops_clear_and_on_segment() {
        let g = room();
        let start = Vec2::new(12.0, 12.0);
        let target = Vec2::new(60.0, 12.0);
        let c = Crate { pos: start, vel: Vec2::new(100.0, 5.0), size: 4.0 };
        let s = sweep(&g, &c, target);
        assert!(s.blocked);
        assert!(!overlaps_solid(&g, &c.aabb_at(s.position)));
        assert!(s.position.x >= start.x && s.position.x <= target.x);
        assert_eq!(s.position.y, 12.0);
        assert!(s.position.x + 4.0 < 50.0);
        // within one search step of the wall
        assert!(50.0 - (s.position.x + 4.0) <= (target.x - start.x) / 1024.0 + 1e-3);
        assert_eq!(s.velocity, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn vertical_block_zeroes_vy_only() {
        let g = room();
        let c = Crate { pos: Vec2::new(22.0, 22.0), vel: Vec2::new(4.0, 80.0), size: 4.0 };
        let s = sweep(&g, &c, Vec2::new(22.0, 40.0));
        assert!(s.blocked);
        assert_eq!(s.velocity, Vec2::new(4.0, 0.0));
        // row 3 is open at column 2, row 4 is the floor wall
        assert!(s.position.y + 4.0 < 40.0);
        assert!(s.position.y > 30.0);
    }

    #[test]
    fn sweep_convergence_over_many_targets() {
        let g = room();
        let start = Vec2::new(22.0, 13.0);
        for i in 0..40 {
            let a = i as f32 * 0.157;
            let target = Vec2::new(start.x + a.cos() * 45.0, start.y + a.sin() * 45.0);
            let c = Crate { pos: start, vel: Vec2::ZERO, size: 4.0 };
            let s = sweep(&g, &c, target);
            assert!(!overlaps_solid(&g, &c.aabb_at(s.position)), "target {target:?}");
            // collinear with start → target
            let cross = (s.position.x - start.x) * (target.y - start.y)
                - (s.position.y - start.y) * (target.x - start.x);
            assert!(cross.abs() < 1e-2);
        }
    }
}
