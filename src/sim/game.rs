/// Game mode state machine: the top-level controller.
///
/// ## Modes
///
///   Start ──start──▶ Run ◀──resume── Pause
///                     │ ──pause──────▶
///                     ├──interact (near object)──▶ Dialog ──last page / close──▶ Run
///                     └──inventory────────────────▶ Inventory ──close──────────▶ Run
///   any ──return to menu──▶ Start (dialog / inventory force-closed)
///
/// Only `Run` simulates. Every other mode refreshes the HUD and handles
/// its own UI input.
///
/// ## Run tick order
///
///   clock → cooldowns → kinematics → zone transition → camera →
///   inventory toggle → nearby hint → interact → autosave
///
/// ## Persistence
///
/// Saved on memory acquisition, zone transition, dialog close, restart
/// and periodically while running. Loaded once at boot.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::collision::overlaps_solid;
use crate::domain::geom::{tile_center, tile_of, Vec2};
use crate::domain::input::Controls;
use crate::domain::interactable::Interactable;
use crate::domain::memory::MemoryLog;
use crate::domain::player::{Facing, Motion, Player};

use super::clock::GameClock;
use super::dialog::{Dialog, Inventory};
use super::event::GameEvent;
use super::portal::check_transition;
use super::save::{self, SaveRecord, SaveStore, SAVE_VERSION};
use super::world::{ActiveWorld, Camera, WorldError, WorldStore};
use super::zone::START_ENTRY;

const INTERACT_COOLDOWN: f32 = 0.18;
const TRANSITION_COOLDOWN: f32 = 0.35;

const AUTOSAVE_PERIOD_MS: u64 = 1200;
const AUTOSAVE_WINDOW_MS: u64 = 16;

/// Viewport in world pixels until the renderer reports its own.
const DEFAULT_VIEW_W: f32 = 960.0;
const DEFAULT_VIEW_H: f32 = 540.0;

const HINT_IDLE: &str = "[enter] interact · [i] inventory · [esc] close";
const STATUS_IDLE: &str = "...";
pub const STATUS_ERROR: &str = "runtime error. check log.";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Start,
    Run,
    Pause,
    Dialog,
    Inventory,
}

/// Discrete UI actions from outside the input contract (menu keys, buttons).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Start,
    Resume,
    Restart,
    ReturnToMenu,
    CloseDialog,
    CloseInventory,
    /// Close whatever is open: dialog, inventory or the pause panel.
    Cancel,
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("world: {0}")]
    World(#[from] WorldError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hud {
    pub zone: &'static str,
    pub zone_label: &'static str,
    pub memory_count: usize,
    pub memory_total: usize,
    pub clock_minutes: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct GameSettings {
    pub motion: Motion,
    pub clock_start_minutes: f32,
    /// In-game minutes per real second.
    pub clock_speed: f32,
    pub inventory_repeat_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            motion: Motion::default(),
            clock_start_minutes: 21.0 * 60.0 + 10.0,
            clock_speed: 0.25,
            inventory_repeat_ms: 110,
        }
    }
}

/// Render contract. Called once per frame in this order: world, player,
/// then the interact bracket if one is due.
pub trait RenderTarget {
    type Error;

    fn draw_world(&mut self, now_ms: u64, game: &Game) -> Result<(), Self::Error>;
    fn draw_player(&mut self, player: &Player, now_ms: u64, glow: f32) -> Result<(), Self::Error>;
    /// `(x, y)` is the world-pixel center of the object's tile.
    fn draw_interact_bracket(&mut self, x: f32, y: f32, now_ms: u64) -> Result<(), Self::Error>;
}

/// Player glow pulse in [0.6, 1.0].
pub fn glow(now_ms: u64) -> f32 {
    (0.8 + 0.2 * (now_ms as f64 * 0.002).sin()) as f32
}

pub struct Game {
    settings: GameSettings,
    world: WorldStore,
    player: Player,
    memories: MemoryLog,
    memory_total: usize,
    clock: GameClock,
    camera: Camera,
    mode: Mode,

    interact_cooldown: f32,
    transition_cooldown: f32,
    cursor_ready_at: Option<u64>,

    hud: Hud,
    status: String,
    hint: String,
    dialog: Dialog,
    inventory: Inventory,

    events: Vec<GameEvent>,
    store: Box<dyn SaveStore>,
}

// ── Construction ──

impl Game {
    /// Build the game in `Start` mode, restoring a save from `store` if
    /// one is there and understood.
    pub fn boot(world: WorldStore, settings: GameSettings, store: Box<dyn SaveStore>) -> Result<Game, GameError> {
        let active = world.active().clone();
        let player = Player::new(active.spawn_point(), active.tile_size, settings.motion);
        let memory_total = world.memory_total();

        let mut game = Game {
            settings,
            world,
            player,
            memories: MemoryLog::new(),
            memory_total,
            clock: GameClock::new(settings.clock_start_minutes, settings.clock_speed),
            camera: Camera::new(DEFAULT_VIEW_W, DEFAULT_VIEW_H),
            mode: Mode::Start,
            interact_cooldown: 0.0,
            transition_cooldown: 0.0,
            cursor_ready_at: None,
            hud: Hud {
                zone: active.name(),
                zone_label: active.zone.label,
                memory_count: 0,
                memory_total,
                clock_minutes: 0.0,
            },
            status: "tip: explore slowly. interact twice with the same object.".to_string(),
            hint: HINT_IDLE.to_string(),
            dialog: Dialog::default(),
            inventory: Inventory::default(),
            events: Vec::new(),
            store,
        };

        game.load_or_init()?;
        game.snap_camera();
        game.refresh_hud();
        Ok(game)
    }

    fn load_or_init(&mut self) -> Result<(), GameError> {
        let Some(raw) = self.store.load() else {
            info!("no save found, fresh start");
            return Ok(());
        };
        let Some(record) = save::deserialize(&raw, self.world.hub()) else {
            warn!("save data not understood, fresh start");
            return Ok(());
        };

        let zone = if self.world.has_zone(&record.zone) {
            record.zone.clone()
        } else {
            warn!(zone = %record.zone, "saved zone unknown, using hub");
            self.world.hub().to_string()
        };
        self.enter_zone(&zone, START_ENTRY)?;

        if let Some((x, y)) = record.position() {
            let spawn = self.player.pos;
            self.player.teleport(Vec2::new(x, y));
            if overlaps_solid(self.world.active(), &self.player.aabb()) {
                warn!(x, y, "saved position is blocked, using spawn");
                self.player.teleport(spawn);
            }
        }

        let world = &self.world;
        self.memories = MemoryLog::restore(&record.mem, &record.mem_data, |id| world.memory(id));
        if let Some(minutes) = record.clock_min {
            self.clock.set_minutes(minutes);
        }

        info!(zone = %zone, memories = self.memories.len(), version = record.v, "save loaded");
        self.status = "save loaded. continue where you left off.".to_string();
        Ok(())
    }
}

// ── Queries ──

impl Game {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn world(&self) -> &ActiveWorld {
        self.world.active()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn memories(&self) -> &MemoryLog {
        &self.memories
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Interactable within reach of the player's tile.
    pub fn nearby(&self) -> Option<&Interactable> {
        let a = self.world.active();
        let (tx, ty) = tile_of(self.player.pos, a.tile_size);
        a.interactable_near(tx, ty)
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
    }

    pub fn set_viewport(&mut self, view_w: f32, view_h: f32) {
        self.camera.set_viewport(view_w, view_h);
    }
}

// ── Per-tick update ──

impl Game {
    pub fn update(&mut self, dt: f32, now_ms: u64, controls: &mut Controls) -> Result<(), GameError> {
        if controls.consume_pause(now_ms) {
            match self.mode {
                Mode::Run => self.pause(),
                Mode::Pause => self.resume(),
                Mode::Start | Mode::Dialog | Mode::Inventory => {}
            }
        }

        match self.mode {
            Mode::Start => {
                if controls.consume_interact(now_ms) {
                    self.start();
                }
            }
            Mode::Pause => {}
            Mode::Dialog => {
                if controls.consume_interact(now_ms) {
                    if self.dialog.advance_or_close() {
                        self.finish_dialog();
                    } else {
                        self.events.push(GameEvent::DialogAdvanced);
                    }
                }
            }
            Mode::Inventory => {
                if controls.consume_inventory(now_ms) {
                    self.close_inventory();
                } else {
                    self.scroll_inventory(controls, now_ms);
                }
            }
            Mode::Run => self.tick_run(dt, now_ms, controls)?,
        }

        self.refresh_hud();
        Ok(())
    }

    fn tick_run(&mut self, dt: f32, now_ms: u64, controls: &mut Controls) -> Result<(), GameError> {
        self.clock.advance(dt);
        self.interact_cooldown = (self.interact_cooldown - dt).max(0.0);
        self.transition_cooldown = (self.transition_cooldown - dt).max(0.0);

        self.player.update(self.world.active(), controls.axes, dt);
        self.try_transition()?;

        let a = self.world.active();
        self.camera.follow(self.player.pos, a.world_w, a.world_h, dt);

        if controls.consume_inventory(now_ms) {
            self.open_inventory();
            return Ok(());
        }

        let zone = Arc::clone(&self.world.active().zone);
        let (tx, ty) = tile_of(self.player.pos, self.world.active().tile_size);
        let nearby = zone.interactable_near(tx, ty);
        self.hint = match nearby {
            Some(o) => format!("[enter] interact: {} · [i] inventory", o.name),
            None => HINT_IDLE.to_string(),
        };

        if let Some(obj) = nearby {
            if self.interact_cooldown <= 0.0 && controls.consume_interact(now_ms) {
                self.interact_cooldown = INTERACT_COOLDOWN;
                self.open_dialog(obj);
            }
        }

        if now_ms % AUTOSAVE_PERIOD_MS < AUTOSAVE_WINDOW_MS {
            self.save();
        }
        Ok(())
    }

    fn try_transition(&mut self) -> Result<(), GameError> {
        if self.transition_cooldown > 0.0 {
            return Ok(());
        }
        let active = self.world.active();
        let (tx, ty) = tile_of(self.player.pos, active.tile_size);
        let Some(t) = check_transition(active, tx, ty) else {
            return Ok(());
        };
        let from = active.name();

        let entered = self.enter_zone(t.zone, t.entry)?;
        self.transition_cooldown = TRANSITION_COOLDOWN;
        info!(from, to = t.zone, entry = t.entry, "zone transition");

        self.status = format!("entered {}.", entered.zone.label);
        self.events.push(GameEvent::ZoneEntered { zone: t.zone, entry: t.entry });
        self.save();
        self.refresh_hud();
        Ok(())
    }

    /// Switch zone and put the player at the entry spawn, at rest.
    fn enter_zone(&mut self, name: &str, entry: &str) -> Result<ActiveWorld, GameError> {
        let active = self.world.set_active_zone(name, entry)?;
        self.player.refresh_body(active.tile_size);
        self.player.teleport(active.spawn_point());
        self.snap_camera();
        Ok(active)
    }

    fn snap_camera(&mut self) {
        let a = self.world.active();
        self.camera.snap(self.player.pos, a.world_w, a.world_h);
    }

    fn refresh_hud(&mut self) {
        let a = self.world.active();
        self.hud = Hud {
            zone: a.name(),
            zone_label: a.zone.label,
            memory_count: self.memories.len(),
            memory_total: self.memory_total,
            clock_minutes: self.clock.minutes(),
        };
    }

    fn scroll_inventory(&mut self, controls: &Controls, now_ms: u64) {
        let dir = if controls.axes.up {
            -1
        } else if controls.axes.down {
            1
        } else {
            0
        };
        if dir == 0 {
            self.cursor_ready_at = None;
            return;
        }
        if self.cursor_ready_at.map_or(true, |t| now_ms >= t) {
            self.inventory.move_cursor(dir);
            self.cursor_ready_at = Some(now_ms + self.settings.inventory_repeat_ms);
            self.events.push(GameEvent::InventoryMoved);
        }
    }
}

// ── Mode transitions ──

impl Game {
    pub fn apply(&mut self, command: Command) -> Result<(), GameError> {
        match command {
            Command::Start => self.start(),
            Command::Resume => self.resume(),
            Command::Restart => self.restart()?,
            Command::ReturnToMenu => self.return_to_menu(),
            Command::CloseDialog => self.close_dialog(),
            Command::CloseInventory => self.close_inventory(),
            Command::Cancel => match self.mode {
                Mode::Dialog => self.close_dialog(),
                Mode::Inventory => self.close_inventory(),
                Mode::Pause => self.resume(),
                Mode::Start | Mode::Run => {}
            },
        }
        self.refresh_hud();
        Ok(())
    }

    fn start(&mut self) {
        if self.mode != Mode::Start {
            return;
        }
        self.mode = Mode::Run;
        self.status = "connected. walk slowly. listen.".to_string();
        self.events.push(GameEvent::Started);
        info!(zone = self.world.active().name(), "run started");
    }

    fn pause(&mut self) {
        if self.mode != Mode::Run {
            return;
        }
        self.mode = Mode::Pause;
        self.status = "paused.".to_string();
        self.events.push(GameEvent::Paused);
    }

    fn resume(&mut self) {
        if self.mode != Mode::Pause {
            return;
        }
        self.mode = Mode::Run;
        self.status = "resumed.".to_string();
        self.events.push(GameEvent::Resumed);
    }

    fn return_to_menu(&mut self) {
        self.dialog.close();
        self.inventory.close();
        self.mode = Mode::Start;
        self.status = "ready.".to_string();
        self.events.push(GameEvent::ReturnedToMenu);
    }

    /// Back to the hub entrance with a fresh clock. Memories are kept.
    fn restart(&mut self) -> Result<(), GameError> {
        let hub = self.world.hub();
        self.enter_zone(hub, START_ENTRY)?;
        self.player.facing = Facing::Right;
        self.player.walk_phase = 0.0;
        self.clock = GameClock::new(self.settings.clock_start_minutes, self.settings.clock_speed);
        self.interact_cooldown = 0.0;
        self.transition_cooldown = 0.0;

        self.dialog.close();
        self.inventory.close();
        self.mode = Mode::Run;

        self.save();
        self.refresh_hud();
        self.status = "restarted at the alley entrance.".to_string();
        self.events.push(GameEvent::Restarted);
        info!("restart");
        Ok(())
    }

    /// Pages are the repeat set only when the memory is already held and
    /// repeat pages exist. An unheld memory is collected on open.
    fn open_dialog(&mut self, obj: &Interactable) {
        let state = obj.dialogue_state(|id| self.memories.contains(id));
        self.dialog.show(obj.name, obj.pages_for(state));
        self.mode = Mode::Dialog;
        self.events.push(GameEvent::DialogOpened { object: obj.id });
        debug!(object = obj.id, ?state, "dialog opened");

        if let Some(memory) = &obj.memory {
            if self.memories.collect(memory) {
                info!(id = %memory.id, count = self.memories.len(), "memory acquired");
                self.status = format!("memory acquired: {}", memory.title);
                self.events.push(GameEvent::MemoryAcquired { id: memory.id.clone() });
                self.refresh_hud();
                self.save();
            }
        }
    }

    fn close_dialog(&mut self) {
        if self.mode != Mode::Dialog {
            return;
        }
        self.dialog.close();
        self.finish_dialog();
    }

    /// Runs when a dialog closes normally (last page or close action).
    fn finish_dialog(&mut self) {
        self.mode = Mode::Run;
        self.save();
        self.refresh_hud();
        self.status = STATUS_IDLE.to_string();
        self.events.push(GameEvent::DialogClosed);
    }

    fn open_inventory(&mut self) {
        self.inventory.show(self.memories.records());
        self.cursor_ready_at = None;
        self.mode = Mode::Inventory;
        self.status = "inventory open.".to_string();
        self.events.push(GameEvent::InventoryOpened);
    }

    fn close_inventory(&mut self) {
        if self.mode != Mode::Inventory {
            return;
        }
        self.inventory.close();
        self.mode = Mode::Run;
        self.status = STATUS_IDLE.to_string();
        self.events.push(GameEvent::InventoryClosed);
    }
}

// ── Persistence ──

impl Game {
    pub fn record(&self) -> SaveRecord {
        SaveRecord {
            v: SAVE_VERSION,
            zone: self.world.active().name().to_string(),
            px: Some(self.player.pos.x),
            py: Some(self.player.pos.y),
            mem: self.memories.ids().map(str::to_string).collect(),
            mem_data: self.memories.records().to_vec(),
            clock_min: Some(self.clock.minutes().floor()),
        }
    }

    fn save(&mut self) {
        match save::serialize(&self.record()) {
            Ok(value) => {
                if self.store.save(&value) {
                    self.events.push(GameEvent::Saved);
                }
            }
            Err(e) => warn!(error = %e, "could not encode save"),
        }
    }
}

// ── Drawing ──

impl Game {
    pub fn draw<R: RenderTarget>(&self, now_ms: u64, target: &mut R) -> Result<(), R::Error> {
        target.draw_world(now_ms, self)?;
        target.draw_player(&self.player, now_ms, glow(now_ms))?;

        if self.mode == Mode::Run {
            if let Some(obj) = self.nearby() {
                let c = tile_center(obj.tx, obj.ty, self.world.active().tile_size);
                target.draw_interact_bracket(c.x, c.y, now_ms)?;
            }
        }
        Ok(())
    }
}
