/// External configuration loader.
///
/// Reads `config.toml` from the first candidate directory that has one.
/// Missing file or missing keys fall back to defaults. A file that does
/// not parse is reported back to the caller (logging is not up yet when
/// configuration loads) and defaults are used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::input::TapWindows;
use crate::domain::player::Motion;
use crate::sim::game::GameSettings;

const APP_DIR: &str = "neonwalk";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} does not parse: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub taps: TapWindows,
    pub inventory_scroll_ms: u64,
    pub motion: Motion,
    pub clock_start_minutes: f32,
    pub clock_speed: f32,
    pub gamepad: GamepadConfig,
    pub save_file: String,
    pub log_file: PathBuf,
    /// File the settings came from, if any.
    pub source: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
pub struct TimingConfig {
    pub tick_hz: u32,
    pub max_frame: Duration,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub interact: Vec<String>,
    pub inventory: Vec<String>,
    pub pause: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    clock: TomlClock,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_hz")]
    tick_hz: u32,
    #[serde(default = "default_max_frame_ms")]
    max_frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_interact_window")]
    interact_window_ms: u64,
    #[serde(default = "default_inventory_window")]
    inventory_window_ms: u64,
    #[serde(default = "default_pause_window")]
    pause_window_ms: u64,
    #[serde(default = "default_inventory_scroll")]
    inventory_scroll_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_accel")]
    accel: f32,
    #[serde(default = "default_friction")]
    friction: f32,
}

#[derive(Deserialize, Debug)]
struct TomlClock {
    #[serde(default = "default_start_minutes")]
    start_minutes: f32,
    #[serde(default = "default_clock_speed")]
    speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_interact")]
    interact: Vec<String>,
    #[serde(default = "default_pad_inventory")]
    inventory: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_save_file")]
    save_file: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_hz() -> u32 { 60 }
fn default_max_frame_ms() -> u64 { 50 }
fn default_interact_window() -> u64 { 160 }
fn default_inventory_window() -> u64 { 220 }
fn default_pause_window() -> u64 { 220 }
fn default_inventory_scroll() -> u64 { 110 }
fn default_speed() -> f32 { 120.0 }   // px/s
fn default_accel() -> f32 { 900.0 }
fn default_friction() -> f32 { 1100.0 }
fn default_start_minutes() -> f32 { 21.0 * 60.0 + 10.0 }
fn default_clock_speed() -> f32 { 0.25 }  // in-game minutes per real second

fn default_pad_interact() -> Vec<String> { vec!["A".into()] }
fn default_pad_inventory() -> Vec<String> { vec!["Y".into(), "X".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_save_file() -> String { "save.json".into() }
fn default_log_file() -> String { "neonwalk.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_hz: default_tick_hz(), max_frame_ms: default_max_frame_ms() }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            interact_window_ms: default_interact_window(),
            inventory_window_ms: default_inventory_window(),
            pause_window_ms: default_pause_window(),
            inventory_scroll_ms: default_inventory_scroll(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer { speed: default_speed(), accel: default_accel(), friction: default_friction() }
    }
}

impl Default for TomlClock {
    fn default() -> Self {
        TomlClock { start_minutes: default_start_minutes(), speed: default_clock_speed() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            interact: default_pad_interact(),
            inventory: default_pad_inventory(),
            pause: default_pad_pause(),
            cancel: default_pad_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { save_file: default_save_file(), log_file: default_log_file() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load `config.toml` from the candidate directories.
    /// The error, if any, is returned alongside the defaults so the caller
    /// can log it once logging is up.
    pub fn load() -> (Self, Option<ConfigError>) {
        let dirs = candidate_dirs();
        match find_config(&dirs) {
            None => (GameConfig::build(TomlConfig::default(), None, &dirs), None),
            Some(path) => match read_config(&path) {
                Ok(cfg) => (GameConfig::build(cfg, Some(path), &dirs), None),
                Err(e) => (GameConfig::build(TomlConfig::default(), None, &dirs), Some(e)),
            },
        }
    }

    /// Parse settings from TOML text. Relative paths resolve against `base`.
    #[cfg(test)]
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig::build(cfg, None, &[base.to_path_buf()]))
    }

    fn build(cfg: TomlConfig, source: Option<PathBuf>, dirs: &[PathBuf]) -> Self {
        // The log goes next to the config file when there is one.
        let log_base = source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| dirs.first().cloned())
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = if Path::new(&cfg.general.log_file).is_absolute() {
            PathBuf::from(&cfg.general.log_file)
        } else {
            log_base.join(&cfg.general.log_file)
        };

        GameConfig {
            timing: TimingConfig {
                tick_hz: cfg.timing.tick_hz,
                max_frame: Duration::from_millis(cfg.timing.max_frame_ms),
            },
            taps: TapWindows {
                interact_ms: cfg.input.interact_window_ms,
                inventory_ms: cfg.input.inventory_window_ms,
                pause_ms: cfg.input.pause_window_ms,
            },
            inventory_scroll_ms: cfg.input.inventory_scroll_ms,
            motion: Motion {
                max_speed: cfg.player.speed,
                accel: cfg.player.accel,
                friction: cfg.player.friction,
            },
            clock_start_minutes: cfg.clock.start_minutes,
            clock_speed: cfg.clock.speed,
            gamepad: GamepadConfig {
                interact: cfg.gamepad.interact,
                inventory: cfg.gamepad.inventory,
                pause: cfg.gamepad.pause,
                cancel: cfg.gamepad.cancel,
            },
            save_file: cfg.general.save_file,
            log_file,
            source,
        }
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            motion: self.motion,
            clock_start_minutes: self.clock_start_minutes,
            clock_speed: self.clock_speed,
            inventory_repeat_ms: self.inventory_scroll_ms,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds files next to
        // the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(CONFIG_FILE)).find(|p| p.is_file())
}

fn read_config(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c = GameConfig::from_toml_str("", Path::new("/tmp/nw")).unwrap();
        assert_eq!(c.timing.tick_hz, 60);
        assert_eq!(c.timing.max_frame, Duration::from_millis(50));
        assert_eq!(c.taps.interact_ms, 160);
        assert_eq!(c.taps.inventory_ms, 220);
        assert_eq!(c.taps.pause_ms, 220);
        assert_eq!(c.inventory_scroll_ms, 110);
        assert_eq!(c.motion.max_speed, 120.0);
        assert_eq!(c.clock_start_minutes, 1270.0);
        assert_eq!(c.gamepad.pause, vec!["Start".to_string()]);
        assert_eq!(c.log_file, PathBuf::from("/tmp/nw/neonwalk.log"));
        assert_eq!(c.save_file, "save.json");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [player]
            speed = 200.0

            [clock]
            start_minutes = 0.0

            [general]
            log_file = "/var/log/nw.log"
        "#;
        let c = GameConfig::from_toml_str(text, Path::new(".")).unwrap();
        assert_eq!(c.motion.max_speed, 200.0);
        assert_eq!(c.motion.accel, 900.0);
        assert_eq!(c.clock_start_minutes, 0.0);
        assert_eq!(c.clock_speed, 0.25);
        assert_eq!(c.log_file, PathBuf::from("/var/log/nw.log"));

        let s = c.game_settings();
        assert_eq!(s.motion.max_speed, 200.0);
        assert_eq!(s.inventory_repeat_ms, 110);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[timing\ntick_hz = ", Path::new(".")).is_err());
        assert!(GameConfig::from_toml_str("[timing]\ntick_hz = \"fast\"", Path::new(".")).is_err());
    }

    #[test]
    fn read_config_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[input]\ninteract_window_ms = -1").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        assert_eq!(find_config(&[dir.path().to_path_buf()]), Some(path));
        assert_eq!(find_config(&[dir.path().join("nope")]), None);
    }
}
