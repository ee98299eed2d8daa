//! Configuration for meshview.
//!
//! Built-in defaults, an optional TOML file and `MESHVIEW_`-prefixed
//! environment variables, layered with figment and translated into the
//! engine and feed settings `meshview_core` consumes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use meshview_core::{DEFAULT_FEED_URL, EngineConfig, LayoutConfig, ReconnectConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub tables: TableHeaders,

    /// Where the TUI writes its log. Defaults to the platform data dir.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSettings {
    /// WebSocket address of the snapshot producer.
    #[serde(default = "default_url")]
    pub url: String,

    /// Reconnection attempts after a close. `0` leaves a closed feed closed.
    #[serde(default)]
    pub max_retries: u32,

    /// Ignore `max_retries` and keep reconnecting.
    #[serde(default)]
    pub reconnect_forever: bool,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_retries: 0,
            reconnect_forever: false,
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_FEED_URL.into()
}
fn default_initial_delay_ms() -> u64 {
    1_000
}
fn default_max_delay_ms() -> u64 {
    30_000
}

/// Declared column headers per table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableHeaders {
    #[serde(default = "EngineConfig::default_node_headers")]
    pub node: Vec<String>,

    #[serde(default = "EngineConfig::default_neighbour_headers")]
    pub neighbour: Vec<String>,
}

impl Default for TableHeaders {
    fn default() -> Self {
        Self {
            node: EngineConfig::default_node_headers(),
            neighbour: EngineConfig::default_neighbour_headers(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "meshview", "meshview")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".meshview").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default log file location when none is configured.
pub fn default_log_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".meshview").join("meshview.log"),
        |dirs| dirs.data_local_dir().join("meshview.log"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from defaults, file and environment.
///
/// `path` overrides the platform config path. A missing file is not an
/// error. Nested keys use a double underscore in the environment, e.g.
/// `MESHVIEW_FEED__URL` or `MESHVIEW_LAYOUT__RESTART`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("MESHVIEW_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, cfg.to_toml()?)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed_url()?;

        if self.feed.initial_delay_ms > self.feed.max_delay_ms {
            return Err(invalid(
                "feed.initial_delay_ms",
                format!(
                    "{} exceeds feed.max_delay_ms ({})",
                    self.feed.initial_delay_ms, self.feed.max_delay_ms
                ),
            ));
        }

        let layout = &self.layout;
        if !(layout.charge.is_finite() && layout.charge >= 0.0) {
            return Err(invalid("layout.charge", "must be a non-negative number"));
        }
        if !(layout.link_distance.is_finite() && layout.link_distance > 0.0) {
            return Err(invalid("layout.link_distance", "must be positive"));
        }
        for (field, size) in [("layout.viewport", layout.viewport), ("layout.canvas", layout.canvas)]
        {
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err(invalid(
                    field,
                    format!("{}x{} is not a positive size", size.width, size.height),
                ));
            }
        }

        Ok(())
    }

    /// The feed address, checked to be a WebSocket URL.
    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        let url: Url = self
            .feed
            .url
            .parse()
            .map_err(|e| invalid("feed.url", format!("{e}: {}", self.feed.url)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(invalid(
                "feed.url",
                format!("expected a ws:// or wss:// address, got '{other}'"),
            )),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            node_headers: self.tables.node.clone(),
            neighbour_headers: self.tables.neighbour.clone(),
            layout: self.layout,
        }
    }

    pub fn reconnect_config(&self) -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(self.feed.initial_delay_ms),
            max_delay: Duration::from_millis(self.feed.max_delay_ms),
            max_retries: (!self.feed.reconnect_forever).then_some(self.feed.max_retries),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(default_log_path)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
