//! Tuning knobs for the streaming pipeline and their on-disk INI form.
//!
//! `StreamingConfig` is the in-memory configuration a coordinator runs with.
//! `ConfigFile` persists it, together with logging preferences, as an INI
//! file under the platform config directory so simulator hosts and the CLI
//! share one source of settings. `ConfigKey` gives tooling an addressable
//! `section.key` handle on every setting for get/set/list commands.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on sections simultaneously in Loading status.
///
/// Four in-flight loads keeps a typical asset backend busy without letting a
/// burst of fresh desire monopolize the threads the host simulation shares
/// with the loader.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 4;

/// Default cap on Load commands issued within a single tick.
pub const DEFAULT_MAX_LOADS_PER_TICK: usize = 8;

/// Default cap on Unload commands issued within a single tick.
pub const DEFAULT_MAX_UNLOADS_PER_TICK: usize = 8;

/// Default cooldown, in ticks, applied after a failure or a completed unload.
///
/// At the default 60 ticks per second this is two seconds, long enough to
/// stop a section sitting on a range boundary from reloading every other
/// tick.
pub const DEFAULT_COOLDOWN_TICKS: u64 = 120;

/// Default tracing filter used when the config file does not set one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while reading, writing, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config file I/O at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The file exists but is not parseable INI.
    #[error("config file parse at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A key holds a value that does not parse as the expected type.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// The key is not one this crate knows about.
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// A structurally valid config fails a semantic check.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Runtime budgets and cooldown tuning for one coordinator.
///
/// Serde-deserializable so scenario files can override it; omitted fields
/// keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Sections allowed in Loading status at once.
    pub max_concurrent_loads: usize,

    /// Load commands issued to the loader per tick, at most.
    pub max_loads_per_tick: usize,

    /// Unload commands issued to the loader per tick, at most.
    pub max_unloads_per_tick: usize,

    /// Ticks a section waits after a failure or unload before it may load
    /// again. Zero disables cooldowns entirely.
    pub cooldown_ticks: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: DEFAULT_MAX_CONCURRENT_LOADS,
            max_loads_per_tick: DEFAULT_MAX_LOADS_PER_TICK,
            max_unloads_per_tick: DEFAULT_MAX_UNLOADS_PER_TICK,
            cooldown_ticks: DEFAULT_COOLDOWN_TICKS,
        }
    }
}

impl StreamingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrent-load ceiling.
    pub fn with_max_concurrent_loads(mut self, max: usize) -> Self {
        self.max_concurrent_loads = max;
        self
    }

    /// Set the per-tick load issue budget.
    pub fn with_max_loads_per_tick(mut self, max: usize) -> Self {
        self.max_loads_per_tick = max;
        self
    }

    /// Set the per-tick unload issue budget.
    pub fn with_max_unloads_per_tick(mut self, max: usize) -> Self {
        self.max_unloads_per_tick = max;
        self
    }

    /// Set the cooldown length in ticks.
    pub fn with_cooldown_ticks(mut self, ticks: u64) -> Self {
        self.cooldown_ticks = ticks;
        self
    }

    /// Check the budgets make sense: every budget must be nonzero.
    ///
    /// A zero budget would starve the pipeline forever while the scanner
    /// keeps queuing intents, so it is rejected here rather than silently
    /// tolerated. `cooldown_ticks` may be zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_loads == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_loads must be at least 1".to_string(),
            ));
        }
        if self.max_loads_per_tick == 0 {
            return Err(ConfigError::Validation(
                "max_loads_per_tick must be at least 1".to_string(),
            ));
        }
        if self.max_unloads_per_tick == 0 {
            return Err(ConfigError::Validation(
                "max_unloads_per_tick must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging preferences persisted alongside the streaming knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing env-filter directive, e.g. `info` or `sectionstream=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Path of the user config file under the platform config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sectionstream")
        .join("config.ini")
}

/// The INI-backed configuration file.
///
/// Layout:
///
/// ```ini
/// [streaming]
/// max_concurrent_loads = 4
/// max_loads_per_tick = 8
/// max_unloads_per_tick = 8
/// cooldown_ticks = 120
///
/// [logging]
/// filter = info
/// ```
///
/// A missing file loads as defaults; a present-but-malformed value is an
/// error, never silently replaced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub streaming: StreamingConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default platform location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io {
                path: path.to_path_buf(),
                message: io.to_string(),
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;

        let mut config = Self::default();

        if let Some(section) = ini.section(Some("streaming")) {
            read_key(section, "streaming", "max_concurrent_loads", &mut config.streaming.max_concurrent_loads)?;
            read_key(section, "streaming", "max_loads_per_tick", &mut config.streaming.max_loads_per_tick)?;
            read_key(section, "streaming", "max_unloads_per_tick", &mut config.streaming.max_unloads_per_tick)?;
            read_key(section, "streaming", "cooldown_ticks", &mut config.streaming.cooldown_ticks)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(filter) = section.get("filter") {
                config.logging.filter = filter.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Save to the default platform location, creating directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("streaming"))
            .set(
                "max_concurrent_loads",
                self.streaming.max_concurrent_loads.to_string(),
            )
            .set(
                "max_loads_per_tick",
                self.streaming.max_loads_per_tick.to_string(),
            )
            .set(
                "max_unloads_per_tick",
                self.streaming.max_unloads_per_tick.to_string(),
            )
            .set("cooldown_ticks", self.streaming.cooldown_ticks.to_string());
        ini.with_section(Some("logging"))
            .set("filter", self.logging.filter.clone());

        ini.write_to_file(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn read_key<T: FromStr>(
    section: &ini::Properties,
    section_name: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = section.get(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: format!("{section_name}.{key}"),
            value: raw.to_string(),
        })?;
    }
    Ok(())
}

/// Addressable configuration keys in `section.key` form, for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    MaxConcurrentLoads,
    MaxLoadsPerTick,
    MaxUnloadsPerTick,
    CooldownTicks,
    LogFilter,
}

impl ConfigKey {
    /// All keys, grouped by section, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::MaxConcurrentLoads,
            ConfigKey::MaxLoadsPerTick,
            ConfigKey::MaxUnloadsPerTick,
            ConfigKey::CooldownTicks,
            ConfigKey::LogFilter,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::MaxConcurrentLoads
            | ConfigKey::MaxLoadsPerTick
            | ConfigKey::MaxUnloadsPerTick
            | ConfigKey::CooldownTicks => "streaming",
            ConfigKey::LogFilter => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::MaxConcurrentLoads => "max_concurrent_loads",
            ConfigKey::MaxLoadsPerTick => "max_loads_per_tick",
            ConfigKey::MaxUnloadsPerTick => "max_unloads_per_tick",
            ConfigKey::CooldownTicks => "cooldown_ticks",
            ConfigKey::LogFilter => "filter",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Read this key's current value as a display string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::MaxConcurrentLoads => config.streaming.max_concurrent_loads.to_string(),
            ConfigKey::MaxLoadsPerTick => config.streaming.max_loads_per_tick.to_string(),
            ConfigKey::MaxUnloadsPerTick => config.streaming.max_unloads_per_tick.to_string(),
            ConfigKey::CooldownTicks => config.streaming.cooldown_ticks.to_string(),
            ConfigKey::LogFilter => config.logging.filter.clone(),
        }
    }

    /// Write `value` into this key, rejecting values of the wrong shape.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
        };
        match self {
            ConfigKey::MaxConcurrentLoads => {
                config.streaming.max_concurrent_loads =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            ConfigKey::MaxLoadsPerTick => {
                config.streaming.max_loads_per_tick =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            ConfigKey::MaxUnloadsPerTick => {
                config.streaming.max_unloads_per_tick =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            ConfigKey::CooldownTicks => {
                config.streaming.cooldown_ticks = value.trim().parse().map_err(|_| invalid())?;
            }
            ConfigKey::LogFilter => {
                config.logging.filter = value.trim().to_string();
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
