//! Configuration for multiterm-rs
//!
//! Settings are stored as TOML in the platform config directory:
//! - **Linux**: `~/.config/multiterm-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/multiterm-rs/config.toml`
//! - **Windows**: `%APPDATA%\multiterm-rs\config.toml`
//!
//! Every section and field has a default, so a partial file (or none) is
//! valid.
//!
//! # Example
//!
//! ```ignore
//! use multiterm_rs::config::{default_config_path, AppConfig, CONFIG_FILE};
//!
//! let path = default_config_path().unwrap_or_else(|| CONFIG_FILE.into());
//! let mut config = AppConfig::load_or_default(&path);
//! config.terminal.hex_dump = true;
//! config.save(&path)?;
//! ```

use crate::backend::display::Color;
use crate::error::{MultitermError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir.
pub const APP_ID: &str = "multiterm-rs";

pub const CONFIG_FILE: &str = "config.toml";

/// Default config file location, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
    pub terminal: TerminalConfig,
}

/// Thread and queue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bounded capacity of the dispatcher's event queue.
    pub channel_capacity: usize,
    /// Bounded capacity of the dispatcher-to-UI message queue.
    pub message_capacity: usize,
    /// Poller sleep after a pass that read nothing, in microseconds. 0 spins.
    pub poll_idle_us: u64,
    /// How often the dispatcher wakes to check the stop flag.
    pub dispatch_timeout_ms: u64,
}

impl RuntimeConfig {
    pub fn poll_idle(&self) -> Duration {
        Duration::from_micros(self.poll_idle_us)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms.max(1))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            message_capacity: 10_000,
            poll_idle_us: 500,
            dispatch_timeout_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` overrides.
    pub filter: String,
    /// Log to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,multiterm_rs=debug".to_string(),
            file: None,
        }
    }
}

/// How the `multiterm` binary wires its graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Hold output back until a full line is available.
    pub line_buffered: bool,
    /// Show a hex dump instead of text.
    pub hex_dump: bool,
    /// Append everything shown to this file.
    pub log_path: Option<PathBuf>,
    /// Route typed lines through a framer, an in-memory device and a
    /// deframer instead of echoing them directly.
    pub loopback: bool,
    pub input_color: Color,
    pub remote_color: Color,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            line_buffered: true,
            hex_dump: false,
            log_path: None,
            loopback: false,
            input_color: Color::WHITE,
            remote_color: Color::GREEN,
        }
    }
}

impl AppConfig {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MultitermError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            MultitermError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the config, or defaults if the file is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                MultitermError::Config(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| MultitermError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            MultitermError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}
