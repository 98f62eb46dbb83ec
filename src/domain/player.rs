/// Player: continuous position, velocity, facing and walk phase,
/// plus the kinematics that turn held input into movement.
///
/// Position is the player's "feet": the body box spans
/// `w` centered horizontally and `h` vertically with 85% above the point.

use super::collision::{sweep, Body, TileGrid};
use super::geom::{approach, Aabb, Vec2};
use super::input::MoveAxes;

/// Scale applied to each axis when moving diagonally (1/√2).
pub const DIAGONAL_SCALE: f32 = 0.7071;

const BODY_WIDTH_RATIO: f32 = 0.55;
const BODY_HEIGHT_RATIO: f32 = 0.60;
const BODY_ANCHOR: f32 = 0.85;

/// Combined |vx| + |vy| above which the walk cycle runs.
const WALK_THRESHOLD: f32 = 8.0;
const WALK_RATE: f32 = 10.0;
const WALK_DECAY: f32 = 14.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub struct Motion {
    pub max_speed: f32,
    pub accel: f32,
    pub friction: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Motion { max_speed: 120.0, accel: 900.0, friction: 1100.0 }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub walk_phase: f32,
    pub width: f32,
    pub height: f32,
    pub motion: Motion,
}

impl Player {
    pub fn new(pos: Vec2, tile_size: f32, motion: Motion) -> Self {
        let mut p = Player {
            pos,
            vel: Vec2::ZERO,
            facing: Facing::Right,
            walk_phase: 0.0,
            width: 0.0,
            height: 0.0,
            motion,
        };
        p.refresh_body(tile_size);
        p
    }

    /// Re-derive body size from the active tile size.
    /// Must run after every zone switch.
    pub fn refresh_body(&mut self, tile_size: f32) {
        self.width = tile_size * BODY_WIDTH_RATIO;
        self.height = tile_size * BODY_HEIGHT_RATIO;
    }

    /// Put the player at `pos` at rest.
    pub fn teleport(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb_at(self.pos)
    }

    pub fn is_moving(&self) -> bool {
        self.vel.x.abs() + self.vel.y.abs() > WALK_THRESHOLD
    }

    /// One fixed step of movement against `grid`.
    pub fn update<G: TileGrid + ?Sized>(&mut self, grid: &G, axes: MoveAxes, dt: f32) {
        let mut ix = 0.0_f32;
        let mut iy = 0.0_f32;
        if axes.left { ix -= 1.0; }
        if axes.right { ix += 1.0; }
        if axes.up { iy -= 1.0; }
        if axes.down { iy += 1.0; }

        if ix != 0.0 && iy != 0.0 {
            ix *= DIAGONAL_SCALE;
            iy *= DIAGONAL_SCALE;
        }
        if ix != 0.0 {
            self.facing = if ix < 0.0 { Facing::Left } else { Facing::Right };
        }

        let m = self.motion;
        self.vel.x = approach(self.vel.x, ix * m.max_speed, m.accel * dt);
        self.vel.y = approach(self.vel.y, iy * m.max_speed, m.accel * dt);
        if ix == 0.0 { self.vel.x = approach(self.vel.x, 0.0, m.friction * dt); }
        if iy == 0.0 { self.vel.y = approach(self.vel.y, 0.0, m.friction * dt); }

        let nx = self.pos.x + self.vel.x * dt;
        let ny = self.pos.y + self.vel.y * dt;

        let rx = sweep(grid, &*self, Vec2::new(nx, self.pos.y));
        self.pos.x = rx.position.x;
        self.vel.x = rx.velocity.x;

        let ry = sweep(grid, &*self, Vec2::new(self.pos.x, ny));
        self.pos.y = ry.position.y;
        self.vel.y = ry.velocity.y;

        if self.is_moving() {
            self.walk_phase += dt * WALK_RATE;
        } else {
            self.walk_phase = approach(self.walk_phase, 0.0, dt * WALK_DECAY);
        }
    }
}

impl Body for Player {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn aabb_at(&self, p: Vec2) -> Aabb {
        Aabb {
            x: p.x - self.width * 0.5,
            y: p.y - self.height * BODY_ANCHOR,
            w: self.width,
            h: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collision::overlaps_solid;
    use crate::domain::collision::test_support::AsciiGrid;
    use crate::domain::tile::TILE_SIZE;

    const DT: f32 = 1.0 / 60.0;

    fn open_field() -> AsciiGrid {
        AsciiGrid::new(
            &[
                "#########",
                "#.......#",
                "#.......#",
                "#.......#",
                "#.......#",
                "#########",
            ],
            TILE_SIZE,
        )
    }

    fn axes(left: bool, right: bool, up: bool, down: bool) -> MoveAxes {
        MoveAxes { left, right, up, down }
    }

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), TILE_SIZE, Motion::default())
    }

    #[test]
    fn body_derives_from_tile_size() {
        let mut p = player_at(100.0, 100.0);
        assert!((p.width - 26.4).abs() < 1e-4);
        assert!((p.height - 28.8).abs() < 1e-4);
        p.refresh_body(32.0);
        assert!((p.width - 17.6).abs() < 1e-4);
    }

    #[test]
    fn accelerates_toward_max_speed() {
        let g = open_field();
        let mut p = player_at(200.0, 150.0);
        p.update(&g, axes(false, true, false, false), DT);
        assert!((p.vel.x - 15.0).abs() < 1e-3);
        for _ in 0..60 {
            p.update(&g, axes(false, true, false, false), DT);
            if p.pos.x > 300.0 { break; }
        }
        assert!(p.vel.x <= 120.0 + 1e-3);
    }

    #[test]
    fn diagonal_speed_is_normalized() {
        let g = open_field();
        let mut p = player_at(200.0, 150.0);
        for _ in 0..10 {
            p.update(&g, axes(false, true, false, true), DT);
        }
        let speed = (p.vel.x * p.vel.x + p.vel.y * p.vel.y).sqrt();
        assert!(speed <= 120.0 + 0.1);
        assert!((p.vel.x - p.vel.y).abs() < 1e-3);
    }

    #[test]
    fn vertical_input_keeps_facing() {
        let g = open_field();
        let mut p = player_at(200.0, 150.0);
        p.update(&g, axes(true, false, false, false), DT);
        assert_eq!(p.facing, Facing::Left);
        p.update(&g, axes(false, false, false, true), DT);
        assert_eq!(p.facing, Facing::Left);
    }

    #[test]
    fn friction_brings_player_to_rest() {
        let g = open_field();
        let mut p = player_at(200.0, 150.0);
        p.vel = Vec2::new(120.0, -60.0);
        for _ in 0..30 {
            p.update(&g, MoveAxes::default(), DT);
        }
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn walking_into_wall_stops_x_only() {
        let g = open_field();
        // Right wall column starts at x = 8 * 48 = 384.
        let wall_x = 8.0 * TILE_SIZE;
        let mut p = player_at(0.0, 150.0);
        p.pos.x = wall_x - p.width * 0.5 - 0.1;
        p.vel = Vec2::new(50.0, 0.0);
        p.update(&g, axes(false, true, false, false), DT);
        assert_eq!(p.vel.x, 0.0);
        assert_eq!(p.vel.y, 0.0);
        assert!(p.aabb().right() < wall_x);
        assert!(!overlaps_solid(&g, &p.aabb()));
    }

    #[test]
    fn wall_at_rest_sweep_keeps_y_velocity() {
        let g = open_field();
        let wall_x = 8.0 * TILE_SIZE;
        let mut p = player_at(0.0, 150.0);
        p.pos.x = wall_x - p.width * 0.5 - 0.1;
        p.vel = Vec2::new(50.0, 0.0);
        let s = sweep(&g, &p, Vec2::new(p.pos.x + p.vel.x * DT, p.pos.y));
        assert_eq!(s.velocity.x, 0.0);
        assert_eq!(s.velocity.y, 0.0);
        assert!(s.position.x <= p.pos.x + p.vel.x * DT);
        assert!(p.aabb_at(s.position).right() < wall_x);
    }

    #[test]
    fn slides_along_wall_when_moving_diagonally() {
        let g = open_field();
        let wall_x = 8.0 * TILE_SIZE;
        let mut p = player_at(0.0, 150.0);
        p.pos.x = wall_x - p.width * 0.5 - 0.1;
        let y0 = p.pos.y;
        for _ in 0..10 {
            p.update(&g, axes(false, true, false, true), DT);
        }
        assert!(p.pos.y > y0);
        assert!(p.aabb().right() < wall_x);
    }

    #[test]
    fn walk_phase_runs_and_decays() {
        let g = open_field();
        let mut p = player_at(200.0, 150.0);
        for _ in 0..20 {
            p.update(&g, axes(false, true, false, false), DT);
        }
        assert!(p.walk_phase > 0.0);
        for _ in 0..200 {
            p.update(&g, MoveAxes::default(), DT);
        }
        assert_eq!(p.walk_phase, 0.0);
    }
}
