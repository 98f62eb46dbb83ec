/// Tile World Store: the zone registry and the active-world snapshot.
///
/// ## Active world
///
/// `ActiveWorld` is an immutable snapshot: the zone (shared `Arc`), the
/// resolved spawn tile and the derived pixel dimensions. It changes only
/// through `WorldStore::set_active_zone`, which returns the new snapshot.
/// Collision, rendering and the HUD read it.
///
/// ## Camera / Viewport
///
/// World and screen coordinates are separate:
///   - `camera`: top-left of the viewport in world pixels
///   - Renderer maps: `screen = world - camera`
///   - Camera follows the player with exponential smoothing
///   - Worlds smaller than the viewport are centered

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::collision::TileGrid;
use crate::domain::geom::{clamp_cam, lerp, tile_center, Vec2};
use crate::domain::interactable::Interactable;
use crate::domain::memory::Memory;
use crate::domain::tile::{Tile, TILE_SIZE};

use super::zone::{self, Zone, START_ENTRY};

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("unknown zone `{name}`")]
    UnknownZone { name: String },
    #[error("world has no zones")]
    NoZones,
    #[error("zone `{zone}` has an empty layout")]
    EmptyZone { zone: String },
    #[error("zone `{zone}`: row {row} has {len} tiles, expected {expected}")]
    RaggedRow { zone: String, row: usize, len: usize, expected: usize },
    #[error("zone `{zone}`: unknown glyph {glyph:?} at ({x}, {y})")]
    BadGlyph { zone: String, glyph: char, x: usize, y: usize },
    #[error("zone `{zone}`: spawn `{entry}` lies outside the grid")]
    SpawnOutOfBounds { zone: String, entry: String },
}

#[derive(Clone, Debug)]
pub struct ActiveWorld {
    pub zone: Arc<Zone>,
    /// Spawn tile resolved for the entry key of the last switch.
    pub spawn: (i32, i32),
    pub tile_size: f32,
    pub world_w: f32,
    pub world_h: f32,
}

impl ActiveWorld {
    fn enter(zone: Arc<Zone>, entry: &str, tile_size: f32) -> Self {
        let spawn = match zone.spawn(entry) {
            Some(s) => s,
            None => {
                let fallback = zone.spawn(START_ENTRY).unwrap_or_else(|| zone.open_center());
                debug!(zone = zone.name, entry, ?fallback, "no spawn for entry, using fallback");
                fallback
            }
        };
        ActiveWorld {
            spawn,
            tile_size,
            world_w: zone.width as f32 * tile_size,
            world_h: zone.height as f32 * tile_size,
            zone,
        }
    }

    pub fn name(&self) -> &'static str {
        self.zone.name
    }

    /// World-pixel center of the spawn tile.
    pub fn spawn_point(&self) -> Vec2 {
        tile_center(self.spawn.0, self.spawn.1, self.tile_size)
    }

    pub fn interactable_near(&self, tx: i32, ty: i32) -> Option<&Interactable> {
        self.zone.interactable_near(tx, ty)
    }
}

impl TileGrid for ActiveWorld {
    fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        self.zone.tile_at(tx, ty)
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }
}

pub struct WorldStore {
    zones: HashMap<&'static str, Arc<Zone>>,
    hub: &'static str,
    tile_size: f32,
    active: ActiveWorld,
}

impl WorldStore {
    /// Register `zones`; the first one is the hub and becomes active at
    /// its `start` entry.
    pub fn new(zones: Vec<Zone>, tile_size: f32) -> Result<Self, WorldError> {
        let hub = zones.first().map(|z| z.name).ok_or(WorldError::NoZones)?;
        let zones: HashMap<_, _> = zones.into_iter().map(|z| (z.name, Arc::new(z))).collect();
        let hub_zone = zones
            .get(hub)
            .cloned()
            .ok_or_else(|| WorldError::UnknownZone { name: hub.to_string() })?;
        let active = ActiveWorld::enter(hub_zone, START_ENTRY, tile_size);
        info!(zones = zones.len(), hub, "world store ready");
        Ok(WorldStore { zones, hub, tile_size, active })
    }

    /// The built-in world.
    pub fn standard() -> Result<Self, WorldError> {
        WorldStore::new(zone::catalog()?, TILE_SIZE)
    }

    pub fn active(&self) -> &ActiveWorld {
        &self.active
    }

    pub fn hub(&self) -> &'static str {
        self.hub
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn zone(&self, name: &str) -> Option<&Arc<Zone>> {
        self.zones.get(name)
    }

    pub fn has_zone(&self, name: &str) -> bool {
        self.zones.contains_key(name)
    }

    /// Tile of the active zone.
    pub fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        self.active.tile_at(tx, ty)
    }

    /// Switch the active zone.
    ///
    /// Spawn resolution: `entry` → `"start"` → the standable tile nearest
    /// the grid center. Callers must refresh the player body and the
    /// camera from the returned snapshot.
    pub fn set_active_zone(&mut self, name: &str, entry: &str) -> Result<ActiveWorld, WorldError> {
        let zone = self
            .zones
            .get(name)
            .cloned()
            .ok_or_else(|| WorldError::UnknownZone { name: name.to_string() })?;
        self.active = ActiveWorld::enter(zone, entry, self.tile_size);
        debug!(zone = name, entry, spawn = ?self.active.spawn, "active zone set");
        Ok(self.active.clone())
    }

    /// Catalog lookup across every zone.
    pub fn memory(&self, id: &str) -> Option<Memory> {
        self.zones.values().flat_map(|z| z.memories()).find(|m| m.id == id).cloned()
    }

    pub fn memory_total(&self) -> usize {
        self.zones.values().map(|z| z.memories().count()).sum()
    }
}

// ── Camera ──

/// Rate of the exponential follow, per second.
const CAMERA_SHARPNESS: f32 = 6.5;
/// Player sits slightly below the vertical center.
const CAMERA_ANCHOR_Y: f32 = 0.55;

#[derive(Clone, Debug)]
pub struct Camera {
    /// World X of the viewport's left edge (negative when centering)
    pub x: f32,
    /// World Y of the viewport's top edge
    pub y: f32,
    pub view_w: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new(view_w: f32, view_h: f32) -> Self {
        Camera { x: 0.0, y: 0.0, view_w, view_h }
    }

    pub fn set_viewport(&mut self, view_w: f32, view_h: f32) {
        self.view_w = view_w;
        self.view_h = view_h;
    }

    fn target(&self, focus: Vec2, world_w: f32, world_h: f32) -> Vec2 {
        Vec2::new(
            clamp_cam(focus.x - self.view_w * 0.5, 0.0, world_w - self.view_w),
            clamp_cam(focus.y - self.view_h * CAMERA_ANCHOR_Y, 0.0, world_h - self.view_h),
        )
    }

    /// Ease toward the clamped target.
    pub fn follow(&mut self, focus: Vec2, world_w: f32, world_h: f32, dt: f32) {
        let t = self.target(focus, world_w, world_h);
        let k = 1.0 - (-dt * CAMERA_SHARPNESS).exp();
        self.x = lerp(self.x, t.x, k);
        self.y = lerp(self.y, t.y, k);
    }

    /// Jump straight to the target. Used on zone switch, boot and restart.
    pub fn snap(&mut self, focus: Vec2, world_w: f32, world_h: f32) {
        let t = self.target(focus, world_w, world_h);
        self.x = t.x;
        self.y = t.y;
    }
}
