//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    pub wallet: WalletConfig,
    pub physics: PhysicsConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub tick_rate_ms: u64,
    pub stats_poll_ms: u64,
    pub receipt_poll_ms: u64,
    /// Static prize pool label; never refreshed from the network.
    pub pool_label: String,
    pub log_file: String,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub api_url: String,
    pub timeout_ms: u64,
}

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub rpc_url: String,
    pub token_address: String,
    pub receiver_address: String,
    pub admin_address: String,
    /// Human-readable fee, e.g. "10" (scaled by `token_decimals`).
    pub entry_fee: String,
    pub token_decimals: u32,
}

/// Scene tunables, in logical pixels (800×600 canvas) and seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub gravity: f32,
    pub flap_velocity: f32,
    pub pipe_speed: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    pub pipe_margin: f32,
    pub spawn_interval_ms: u32,
    pub ground_height: f32,
    pub bird_x: f32,
    pub bird_width: f32,
    pub bird_height: f32,
    pub die_delay_ms: u32,
    pub report_delay_ms: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub flap: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    backend: TomlBackend,
    #[serde(default)]
    wallet: TomlWallet,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_stats_poll")]
    stats_poll_ms: u64,
    #[serde(default = "default_receipt_poll")]
    receipt_poll_ms: u64,
    #[serde(default = "default_pool_label")]
    pool_label: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlBackend {
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default = "default_timeout")]
    timeout_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlWallet {
    #[serde(default = "default_rpc_url")]
    rpc_url: String,
    #[serde(default = "default_token")]
    token_address: String,
    #[serde(default = "default_admin")]
    receiver_address: String,
    #[serde(default = "default_admin")]
    admin_address: String,
    #[serde(default = "default_entry_fee")]
    entry_fee: String,
    #[serde(default = "default_decimals")]
    token_decimals: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_flap")]
    flap_velocity: f32,
    #[serde(default = "default_pipe_speed")]
    pipe_speed: f32,
    #[serde(default = "default_pipe_gap")]
    pipe_gap: f32,
    #[serde(default = "default_spawn_interval")]
    spawn_interval_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_flap")]
    flap: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_stats_poll() -> u64 { 2000 }
fn default_receipt_poll() -> u64 { 1000 }
fn default_pool_label() -> String { "$15,000 USD".into() }
fn default_log_file() -> String { "flappy-base.log".into() }

fn default_api_url() -> String { "http://localhost:3000/api".into() }
fn default_timeout() -> u64 { 5000 }

fn default_rpc_url() -> String { "http://127.0.0.1:1248".into() }
fn default_token() -> String { "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into() } // USDC on Base
fn default_admin() -> String { "0x1FE0D4089D100B30263c83A82a25987e2cdaD715".into() }
fn default_entry_fee() -> String { "10".into() }
fn default_decimals() -> u32 { 6 }

fn default_gravity() -> f32 { 1000.0 }
fn default_flap() -> f32 { -350.0 }
fn default_pipe_speed() -> f32 { 200.0 }
fn default_pipe_gap() -> f32 { 160.0 }
fn default_spawn_interval() -> u32 { 1500 }

fn default_pad_flap() -> Vec<String> { vec!["A".into(), "B".into(), "R1".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            stats_poll_ms: default_stats_poll(),
            receipt_poll_ms: default_receipt_poll(),
            pool_label: default_pool_label(),
            log_file: default_log_file(),
        }
    }
}

impl Default for TomlBackend {
    fn default() -> Self {
        TomlBackend {
            api_url: default_api_url(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for TomlWallet {
    fn default() -> Self {
        TomlWallet {
            rpc_url: default_rpc_url(),
            token_address: default_token(),
            receiver_address: default_admin(),
            admin_address: default_admin(),
            entry_fee: default_entry_fee(),
            token_decimals: default_decimals(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            flap_velocity: default_flap(),
            pipe_speed: default_pipe_speed(),
            pipe_gap: default_pipe_gap(),
            spawn_interval_ms: default_spawn_interval(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            flap: default_pad_flap(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            canvas_width: 800.0,
            canvas_height: 600.0,
            gravity: default_gravity(),
            flap_velocity: default_flap(),
            pipe_speed: default_pipe_speed(),
            pipe_width: 52.0,
            pipe_gap: default_pipe_gap(),
            pipe_margin: 100.0,
            spawn_interval_ms: default_spawn_interval(),
            ground_height: 112.0,
            bird_x: 100.0,
            bird_width: 51.0,   // 34×24 sprite at 1.5×
            bird_height: 36.0,
            die_delay_ms: 200,
            report_delay_ms: 500,
        }
    }
}

impl PhysicsConfig {
    /// Widest gap that still leaves `pipe_margin` above it and between it
    /// and the ground.
    pub fn max_pipe_gap(&self) -> f32 {
        (self.canvas_height - self.ground_height - 2.0 * self.pipe_margin).max(0.0)
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        Self::from_toml(load_toml(&search_dirs))
    }

    /// Parse a config document directly. Invalid TOML yields the defaults.
    #[allow(dead_code)]
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => Self::from_toml(cfg),
            Err(e) => {
                tracing::warn!("config parse error: {e}; using defaults");
                Self::from_toml(TomlConfig::default())
            }
        }
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let mut physics = PhysicsConfig {
            gravity: toml_cfg.physics.gravity,
            flap_velocity: toml_cfg.physics.flap_velocity,
            pipe_speed: toml_cfg.physics.pipe_speed,
            spawn_interval_ms: toml_cfg.physics.spawn_interval_ms.max(1),
            ..PhysicsConfig::default()
        };
        let max_gap = physics.max_pipe_gap();
        if !(0.0..=max_gap).contains(&toml_cfg.physics.pipe_gap) {
            tracing::warn!(pipe_gap = toml_cfg.physics.pipe_gap, max_gap, "pipe_gap out of range; clamped");
        }
        physics.pipe_gap = if toml_cfg.physics.pipe_gap.is_nan() {
            default_pipe_gap()
        } else {
            toml_cfg.physics.pipe_gap.clamp(0.0, max_gap)
        };

        GameConfig {
            general: GeneralConfig {
                tick_rate_ms: toml_cfg.general.tick_rate_ms.max(1),
                stats_poll_ms: toml_cfg.general.stats_poll_ms.max(1),
                receipt_poll_ms: toml_cfg.general.receipt_poll_ms.max(1),
                pool_label: toml_cfg.general.pool_label,
                log_file: toml_cfg.general.log_file,
            },
            backend: BackendConfig {
                api_url: toml_cfg.backend.api_url.trim_end_matches('/').to_string(),
                timeout_ms: toml_cfg.backend.timeout_ms,
            },
            wallet: WalletConfig {
                rpc_url: toml_cfg.wallet.rpc_url,
                token_address: toml_cfg.wallet.token_address,
                receiver_address: toml_cfg.wallet.receiver_address,
                admin_address: toml_cfg.wallet.admin_address,
                entry_fee: toml_cfg.wallet.entry_fee,
                token_decimals: toml_cfg.wallet.token_decimals,
            },
            physics,
            gamepad: GamepadConfig {
                flap: toml_cfg.gamepad.flap,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
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

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/flappy-base");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
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
                        tracing::warn!("{}: parse error: {e}; using default settings", path.display());
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    tracing::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
