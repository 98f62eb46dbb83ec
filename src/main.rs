/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::input::Controls;
use sim::engine::{report_error, Engine, Simulation};
use sim::event::GameEvent;
use sim::game::{Command, Game, GameError, Mode, STATUS_ERROR};
use sim::save::FileStore;
use sim::world::{WorldError, WorldStore};
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState};
use ui::renderer::Renderer;
use ui::sound::{BlipKind, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("terminal: {0}")]
    Io(#[from] io::Error),
    #[error("game: {0}")]
    Game(#[from] GameError),
    #[error("world data: {0}")]
    World(#[from] WorldError),
}

fn main() {
    let (config, config_error) = GameConfig::load();
    init_tracing(&config);
    if let Some(e) = config_error {
        warn!(error = %e, "config ignored, using defaults");
    }
    info!(config = ?config.source, log = %config.log_file.display(), "neonwalk starting");

    if let Err(e) = run(&config) {
        tracing::error!(error = %e, "fatal");
        eprintln!("neonwalk: {e}");
        std::process::exit(1);
    }
}

/// Logs go to a file: stdout belongs to the terminal UI.
fn init_tracing(config: &GameConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match File::create(&config.log_file) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .compact()
            .with_writer(Mutex::new(file))
            .init(),
        // No writable log location: stay silent rather than draw over the UI.
        Err(_) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
}

fn run(config: &GameConfig) -> Result<(), AppError> {
    let world = WorldStore::standard()?;
    let store = FileStore::new(&config.save_file);
    debug!(path = %store.path().display(), "save location");
    let game = Game::boot(world, config.game_settings(), Box::new(store))?;

    let mut app = App {
        game,
        controls: Controls::new(config.taps),
        renderer: Renderer::new(),
        sound: SoundEngine::new(),
    };
    app.renderer.init()?;

    let mut kb = InputState::new();
    kb.honor_release = enable_release_events();

    let result = frame_loop(&mut app, &mut kb, config);

    if kb.honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    app.renderer.cleanup()?;
    result
}

/// Ask the terminal for key release events. True when granted.
fn enable_release_events() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    match execute!(io::stdout(), PushKeyboardEnhancementFlags(flags)) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "keyboard enhancement refused");
            false
        }
    }
}

fn frame_loop(app: &mut App, kb: &mut InputState, config: &GameConfig) -> Result<(), AppError> {
    let mut gp = GamepadState::new(&config.gamepad);
    let mut engine = Engine::new(config.timing.tick_hz, config.timing.max_frame, Instant::now());
    debug!(
        gamepad = gp.connected,
        release_events = kb.honor_release,
        fixed_dt = ?engine.fixed_dt(),
        "input ready"
    );

    loop {
        kb.drain_events();
        gp.update();

        let now = Instant::now();
        let now_ms = engine.elapsed_ms(now);

        let mut axes = kb.axes();
        let pad = gp.axes();
        axes.left |= pad.left;
        axes.right |= pad.right;
        axes.up |= pad.up;
        axes.down |= pad.down;
        app.controls.axes = axes;

        let mut actions = kb.actions();
        actions.extend(gp.actions());
        if kb.had_input() || !actions.is_empty() || axes.any() {
            // Audio may only begin after a user gesture.
            app.sound.start();
            app.sound.resume_if_needed();
        }
        for action in actions {
            if app.handle_action(action, now_ms) == Flow::Quit {
                info!("quit");
                return Ok(());
            }
        }

        let report = engine.frame(now, app);
        if report.errors > 0 {
            debug!(ticks = report.ticks, errors = report.errors, "frame reported errors");
        }
        std::thread::sleep(FRAME_SLEEP);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    game: Game,
    controls: Controls,
    renderer: Renderer,
    sound: SoundEngine,
}

impl App {
    /// Taps go through the input contract; menu keys become commands.
    fn handle_action(&mut self, action: Action, now_ms: u64) -> Flow {
        match action {
            Action::Interact => self.controls.press_interact(now_ms),
            Action::Inventory => self.controls.press_inventory(now_ms),
            Action::Pause => self.controls.press_pause(now_ms),
            Action::Cancel => self.command(Command::Cancel),
            Action::Restart => {
                if self.game.mode() == Mode::Pause {
                    self.command(Command::Restart);
                }
            }
            Action::Menu => {
                if self.game.mode() == Mode::Start {
                    return Flow::Quit;
                }
                self.command(Command::ReturnToMenu);
            }
            Action::Mute => {
                self.sound.toggle_mute();
                self.game.set_status(if self.sound.is_muted() { "sound off" } else { "sound on" });
            }
            Action::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// A failed command goes to the error hook like a failed tick.
    fn command(&mut self, command: Command) {
        if let Err(e) = self.game.apply(command) {
            report_error(self, "command", &AppError::from(e));
        }
    }

    fn play_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::MemoryAcquired { id } => {
                    info!(memory = %id, "memory acquired");
                    self.sound.blip(BlipKind::Memory);
                }
                GameEvent::DialogAdvanced
                | GameEvent::InventoryOpened
                | GameEvent::InventoryClosed
                | GameEvent::InventoryMoved => self.sound.blip(BlipKind::Ui),
                GameEvent::ZoneEntered { zone, entry } => info!(zone, entry, "zone entered"),
                GameEvent::Started | GameEvent::Restarted => self.sound.start(),
                _ => {}
            }
        }
    }
}

impl Simulation for App {
    type Error = AppError;

    fn update(&mut self, dt: f32, now_ms: u64) -> Result<(), AppError> {
        let result = self.game.update(dt, now_ms, &mut self.controls);
        let events = self.game.take_events();
        self.play_events(&events);
        Ok(result?)
    }

    fn draw(&mut self, now_ms: u64) -> Result<(), AppError> {
        self.renderer.sync_viewport(&mut self.game)?;
        self.game.draw(now_ms, &mut self.renderer)?;
        self.renderer.present(now_ms, &self.game)?;
        Ok(())
    }

    fn on_error(&mut self, _error: &AppError) {
        self.game.set_status(STATUS_ERROR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::game::GameSettings;
    use crate::sim::save::MemoryStore;

    fn app() -> App {
        let world = WorldStore::standard().unwrap();
        let game = Game::boot(world, GameSettings::default(), Box::new(MemoryStore::default())).unwrap();
        App {
            game,
            controls: Controls::default(),
            renderer: Renderer::new(),
            sound: SoundEngine::new(),
        }
    }

    #[test]
    fn menu_key_quits_only_from_the_start_screen() {
        let mut a = app();
        assert_eq!(a.handle_action(Action::Menu, 0), Flow::Quit);
        a.game.apply(Command::Start).unwrap();
        assert_eq!(a.handle_action(Action::Menu, 10), Flow::Continue);
        assert_eq!(a.game.mode(), Mode::Start);
    }

    #[test]
    fn restart_key_needs_the_pause_panel() {
        let mut a = app();
        a.game.apply(Command::Start).unwrap();
        a.game.take_events();
        assert_eq!(a.handle_action(Action::Restart, 0), Flow::Continue);
        assert!(a.game.take_events().is_empty());
        a.controls.press_pause(20);
        a.game.update(1.0 / 60.0, 20, &mut a.controls).unwrap();
        assert_eq!(a.game.mode(), Mode::Pause);
        a.handle_action(Action::Restart, 40);
        assert_eq!(a.game.mode(), Mode::Run);
        assert!(a.game.take_events().contains(&GameEvent::Restarted));
    }

    #[test]
    fn command_errors_land_in_the_status_line() {
        let mut a = app();
        let err = AppError::from(GameError::from(WorldError::UnknownZone { name: "moon".into() }));
        report_error(&mut a, "command", &err);
        assert_eq!(a.game.status(), STATUS_ERROR);
        // the game is still usable
        assert_eq!(a.handle_action(Action::Mute, 0), Flow::Continue);
        assert_eq!(a.game.status(), "sound off");
    }
}
