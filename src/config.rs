/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::sim::Millis;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub gamepad: GamepadConfig,
    pub maps_dir: PathBuf,
    pub map: String,
    pub frame_sleep_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovementConfig {
    pub tile_size: u32,
    pub half_step_ms: Millis,      // one of the two half-steps; a tile takes twice this
    pub hold_threshold_ms: Millis, // press length before continuous walking starts
}

impl Default for MovementConfig {
    fn default() -> Self {
        MovementConfig {
            tile_size: default_tile_size(),
            half_step_ms: default_half_step(),
            hold_threshold_ms: default_hold_threshold(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputConfig {
    pub key_hold_timeout_ms: u64, // gap allowed between auto-repeats
    pub key_repeat_delay_ms: u64, // gap allowed before the first auto-repeat
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub interact: Vec<String>,
    pub music: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default = "default_half_step")]
    half_step_ms: u64,
    #[serde(default = "default_hold_threshold")]
    hold_threshold_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_viewport_w")]
    viewport_width: u32,
    #[serde(default = "default_viewport_h")]
    viewport_height: u32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_key_hold_timeout")]
    key_hold_timeout_ms: u64,
    #[serde(default = "default_key_repeat_delay")]
    key_repeat_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_interact")]
    interact: Vec<String>,
    #[serde(default = "default_music")]
    music: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_maps_dir")]
    maps_dir: String,
    #[serde(default = "default_map")]
    map: String,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
}

// ── Defaults ──

fn default_tile_size() -> u32 { 16 }
fn default_half_step() -> u64 { 125 }      // 250ms per tile
fn default_hold_threshold() -> u64 { 200 }
fn default_viewport_w() -> u32 { 240 }     // 15 tiles
fn default_viewport_h() -> u32 { 160 }     // 10 tiles
fn default_key_hold_timeout() -> u64 { 160 }
fn default_key_repeat_delay() -> u64 { 550 } // above the usual 500ms OS delay

fn default_interact() -> Vec<String> { vec!["A".into()] }
fn default_music() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_maps_dir() -> String { "maps".into() }
fn default_map() -> String { "meadow".into() }
fn default_frame_sleep() -> u64 { 5 }

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            tile_size: default_tile_size(),
            half_step_ms: default_half_step(),
            hold_threshold_ms: default_hold_threshold(),
        }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera {
            viewport_width: default_viewport_w(),
            viewport_height: default_viewport_h(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            key_hold_timeout_ms: default_key_hold_timeout(),
            key_repeat_delay_ms: default_key_repeat_delay(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            interact: default_interact(),
            music: default_music(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            maps_dir: default_maps_dir(),
            map: default_map(),
            frame_sleep_ms: default_frame_sleep(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let maps_dir = resolve_dir(&toml_cfg.general.maps_dir, search_dirs);

        let mut movement = MovementConfig {
            tile_size: toml_cfg.movement.tile_size,
            half_step_ms: toml_cfg.movement.half_step_ms,
            hold_threshold_ms: toml_cfg.movement.hold_threshold_ms,
        };
        // Half-steps split a tile evenly, so the tile must be even and non-zero.
        if movement.tile_size == 0 || movement.tile_size % 2 != 0 {
            warn!(tile_size = movement.tile_size, "tile_size must be even and positive, using default");
            movement.tile_size = default_tile_size();
        }

        GameConfig {
            movement,
            camera: CameraConfig {
                viewport_width: toml_cfg.camera.viewport_width.max(1),
                viewport_height: toml_cfg.camera.viewport_height.max(1),
            },
            input: InputConfig {
                key_hold_timeout_ms: toml_cfg.input.key_hold_timeout_ms,
                // A shorter first window would drop the hold before repeats begin.
                key_repeat_delay_ms: toml_cfg.input.key_repeat_delay_ms
                    .max(toml_cfg.input.key_hold_timeout_ms),
            },
            gamepad: GamepadConfig {
                interact: toml_cfg.gamepad.interact,
                music: toml_cfg.gamepad.music,
                quit: toml_cfg.gamepad.quit,
            },
            maps_dir,
            map: toml_cfg.general.map,
            frame_sleep_ms: toml_cfg.general.frame_sleep_ms,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[])
    }
}

/// Absolute paths are taken as-is; relative ones are looked up in the
/// candidate directories, defaulting to relative-to-CWD.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds data beside the real one.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path);
        }
    }
    info!("no config.toml found, using defaults");
    TomlConfig::default()
}

fn read_toml(path: &Path) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded config");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config.toml");
            TomlConfig::default()
        }
    }
}
