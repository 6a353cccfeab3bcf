/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or the
/// user's config directory. Falls back to sensible defaults if the file
/// is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub session: SessionConfig,
    pub traps: TrapConfig,
    pub stamina: StaminaConfig,
    pub enemies: EnemyConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_move_ticks: u32,
    pub sprint_move_ticks: u32,
    pub enemy_move_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub escape_seconds: u64,
    pub hunter_seconds: u64,
    pub escape_enemies: usize,
    pub hunter_enemies: usize,
}

#[derive(Clone, Debug)]
pub struct TrapConfig {
    pub max_traps: usize,
    pub cooldown_secs: f32,
    pub anim_step_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct StaminaConfig {
    pub max: f32,
    pub drain_per_sec: f32,
    pub recover_per_sec: f32,
}

#[derive(Clone, Debug)]
pub struct EnemyConfig {
    pub flee_radius: i32,
    pub respawn_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    /// 0 (mute) to 10.
    pub volume: u8,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub sprint: Vec<String>,
    pub trap: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    traps: TomlTraps,
    #[serde(default)]
    stamina: TomlStamina,
    #[serde(default)]
    enemies: TomlEnemies,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_move")]
    player_move_ticks: u32,
    #[serde(default = "default_sprint_move")]
    sprint_move_ticks: u32,
    #[serde(default = "default_enemy_move")]
    enemy_move_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_escape_seconds")]
    escape_seconds: u64,
    #[serde(default = "default_hunter_seconds")]
    hunter_seconds: u64,
    #[serde(default = "default_escape_enemies")]
    escape_enemies: usize,
    #[serde(default = "default_hunter_enemies")]
    hunter_enemies: usize,
}

#[derive(Deserialize, Debug)]
struct TomlTraps {
    #[serde(default = "default_max_traps")]
    max_traps: usize,
    #[serde(default = "default_trap_cooldown")]
    cooldown_secs: f32,
    #[serde(default = "default_trap_anim_step")]
    anim_step_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlStamina {
    #[serde(default = "default_stamina_max")]
    max: f32,
    #[serde(default = "default_stamina_drain")]
    drain_per_sec: f32,
    #[serde(default = "default_stamina_recover")]
    recover_per_sec: f32,
}

#[derive(Deserialize, Debug)]
struct TomlEnemies {
    #[serde(default = "default_flee_radius")]
    flee_radius: i32,
    #[serde(default = "default_respawn_seconds")]
    respawn_seconds: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_volume")]
    volume: u8,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_sprint")]
    sprint: Vec<String>,
    #[serde(default = "default_pad_trap")]
    trap: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_player_move() -> u32 { 6 }
fn default_sprint_move() -> u32 { 3 }
fn default_enemy_move() -> u32 { 8 }

fn default_escape_seconds() -> u64 { 120 }
fn default_hunter_seconds() -> u64 { 90 }
fn default_escape_enemies() -> usize { 3 }
fn default_hunter_enemies() -> usize { 4 }

fn default_max_traps() -> usize { 3 }
fn default_trap_cooldown() -> f32 { 5.0 }
fn default_trap_anim_step() -> u32 { 2 }

fn default_stamina_max() -> f32 { 100.0 }
fn default_stamina_drain() -> f32 { 20.0 }
fn default_stamina_recover() -> f32 { 10.0 }

fn default_flee_radius() -> i32 { 5 }
fn default_respawn_seconds() -> u64 { 10 }

fn default_volume() -> u8 { 7 }

fn default_pad_sprint() -> Vec<String> { vec!["R1".into(), "L1".into()] }
fn default_pad_trap() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_move_ticks: default_player_move(),
            sprint_move_ticks: default_sprint_move(),
            enemy_move_ticks: default_enemy_move(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            escape_seconds: default_escape_seconds(),
            hunter_seconds: default_hunter_seconds(),
            escape_enemies: default_escape_enemies(),
            hunter_enemies: default_hunter_enemies(),
        }
    }
}

impl Default for TomlTraps {
    fn default() -> Self {
        TomlTraps {
            max_traps: default_max_traps(),
            cooldown_secs: default_trap_cooldown(),
            anim_step_ticks: default_trap_anim_step(),
        }
    }
}

impl Default for TomlStamina {
    fn default() -> Self {
        TomlStamina {
            max: default_stamina_max(),
            drain_per_sec: default_stamina_drain(),
            recover_per_sec: default_stamina_recover(),
        }
    }
}

impl Default for TomlEnemies {
    fn default() -> Self {
        TomlEnemies {
            flee_radius: default_flee_radius(),
            respawn_seconds: default_respawn_seconds(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { volume: default_volume() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            sprint: default_pad_sprint(),
            trap: default_pad_trap(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) CWD, (3) user config dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());

        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
                player_move_ticks: toml_cfg.speed.player_move_ticks.max(1),
                sprint_move_ticks: toml_cfg.speed.sprint_move_ticks.max(1),
                enemy_move_ticks: toml_cfg.speed.enemy_move_ticks.max(1),
            },
            session: SessionConfig {
                escape_seconds: toml_cfg.session.escape_seconds.max(10),
                hunter_seconds: toml_cfg.session.hunter_seconds.max(10),
                escape_enemies: toml_cfg.session.escape_enemies.max(1),
                hunter_enemies: toml_cfg.session.hunter_enemies.max(1),
            },
            traps: TrapConfig {
                max_traps: toml_cfg.traps.max_traps.max(1),
                cooldown_secs: toml_cfg.traps.cooldown_secs.max(0.0),
                anim_step_ticks: toml_cfg.traps.anim_step_ticks.max(1),
            },
            stamina: StaminaConfig {
                max: toml_cfg.stamina.max.max(1.0),
                drain_per_sec: toml_cfg.stamina.drain_per_sec.max(0.0),
                recover_per_sec: toml_cfg.stamina.recover_per_sec.max(0.0),
            },
            enemies: EnemyConfig {
                flee_radius: toml_cfg.enemies.flee_radius.max(0),
                respawn_seconds: toml_cfg.enemies.respawn_seconds,
            },
            audio: AudioConfig {
                volume: toml_cfg.audio.volume.min(10),
            },
            gamepad: GamepadConfig {
                sprint: toml_cfg.gamepad.sprint,
                trap: toml_cfg.gamepad.trap,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
        }
    }
}

/// Candidate directories to search (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/mazebound still finds data
        // relative to the real binary.
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

    // 3. $XDG_CONFIG_HOME/mazebound, else ~/.config/mazebound
    let xdg = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .map(|base| base.join("mazebound"));
    if let Ok(cfg_dir) = xdg {
        if cfg_dir.is_dir() && !dirs.iter().any(|d| d == &cfg_dir) {
            dirs.push(cfg_dir);
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
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
