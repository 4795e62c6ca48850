//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → CLI flags.
//!
//! Config lives at `~/.switchboard/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub nick: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub default_port: Option<u16>,
    pub max_scrollback: Option<usize>,
    pub connect_timeout_secs: Option<u64>,
    pub focus_new_windows: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// A server to connect to at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerEntry {
    pub host: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Parses a `host[:port]` CLI argument.
pub fn parse_server_arg(arg: &str) -> Result<ServerEntry, String> {
    let (host, port) = match arg.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port in '{arg}'"))?;
            (host, Some(port))
        }
        None => (arg, None),
    };
    if host.is_empty() {
        return Err(format!("missing host in '{arg}'"));
    }
    Ok(ServerEntry {
        host: host.to_string(),
        port,
        channels: Vec::new(),
    })
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_NICK: &str = "switchboard";
pub const DEFAULT_REALNAME: &str = "Switchboard";
pub const DEFAULT_PORT: u16 = 6667;
pub const DEFAULT_MAX_SCROLLBACK: usize = 1000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_LOG_FILE: &str = "switchboard.log";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub default_port: u16,
    /// Lines retained per window; 0 keeps everything.
    pub max_scrollback: usize,
    pub connect_timeout: Duration,
    pub focus_new_windows: bool,
    pub log_level: String,
    pub log_file: PathBuf,
    pub servers: Vec<ServerEntry>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&SwitchboardConfig::default(), &CliOverrides::default())
    }
}

/// Values given on the command line. `None` / empty means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub nick: Option<String>,
    pub connect: Vec<ServerEntry>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.switchboard/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".switchboard").join("config.toml"))
}

/// Load config from `~/.switchboard/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `SwitchboardConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<SwitchboardConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(SwitchboardConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(SwitchboardConfig::default());
    }

    load_config_from(&path)
}

/// Load config from an explicit path. A missing file is an error here.
pub fn load_config_from(path: &Path) -> Result<SwitchboardConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: SwitchboardConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r##"# Switchboard Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → CLI flags.

# [general]
# nick = "switchboard"
# username = "switchboard"             # Defaults to the nick
# realname = "Switchboard"
# default_port = 6667                  # Used by /connect when no port is given
# max_scrollback = 1000                # Lines kept per window, 0 = unlimited
# connect_timeout_secs = 10
# focus_new_windows = true             # Jump to windows opened by /join or messages you send
# log_level = "debug"                  # "error", "warn", "info", "debug", "trace", "off"
# log_file = "switchboard.log"

# [[servers]]
# host = "irc.libera.chat"
# port = 6667
# channels = ["#rust"]
"##;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → CLI.
pub fn resolve(config: &SwitchboardConfig, cli: &CliOverrides) -> ResolvedConfig {
    let general = &config.general;

    // Nick: CLI → config → default
    let nick = cli
        .nick
        .clone()
        .or_else(|| general.nick.clone())
        .unwrap_or_else(|| DEFAULT_NICK.to_string());

    // Username falls back to the nick, not the default nick
    let username = general.username.clone().unwrap_or_else(|| nick.clone());

    // Servers: CLI list replaces the config list when given
    let servers = if cli.connect.is_empty() {
        config.servers.clone()
    } else {
        cli.connect.clone()
    };

    ResolvedConfig {
        nick,
        username,
        realname: general
            .realname
            .clone()
            .unwrap_or_else(|| DEFAULT_REALNAME.to_string()),
        default_port: general.default_port.unwrap_or(DEFAULT_PORT),
        max_scrollback: general.max_scrollback.unwrap_or(DEFAULT_MAX_SCROLLBACK),
        connect_timeout: Duration::from_secs(
            general
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
        focus_new_windows: general.focus_new_windows.unwrap_or(true),
        log_level: cli
            .log_level
            .clone()
            .or_else(|| general.log_level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        log_file: PathBuf::from(
            cli.log_file
                .clone()
                .or_else(|| general.log_file.clone())
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        ),
        servers,
    }
}
