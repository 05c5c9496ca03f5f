// Configuration loading and parsing (config/lodraft.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Name of the single config file, both in `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "lodraft.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed: FeedConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    feed: FeedConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedConfig {
    /// Port the game-client bridge connects to on 127.0.0.1.
    pub port: u16,
}

/// Periods and delays, all in seconds of game time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_secs: f64,
    pub search_poll_secs: f64,
    pub drag_settle_secs: f64,
    pub rebuild_delay_secs: f64,
    pub pulse_secs: f64,
    pub pulse_interval_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_secs: 0.1,
            search_poll_secs: 0.25,
            drag_settle_secs: 0.1,
            rebuild_delay_secs: 0.1,
            pulse_secs: 3.0,
            pulse_interval_secs: 30.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/lodraft.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        feed: file.feed,
        timing: file.timing,
        logging: file.logging,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.feed.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "feed.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    let t = &config.timing;
    let timings: &[(&str, f64)] = &[
        ("timing.tick_secs", t.tick_secs),
        ("timing.search_poll_secs", t.search_poll_secs),
        ("timing.drag_settle_secs", t.drag_settle_secs),
        ("timing.rebuild_delay_secs", t.rebuild_delay_secs),
        ("timing.pulse_secs", t.pulse_secs),
        ("timing.pulse_interval_secs", t.pulse_interval_secs),
    ];
    for (name, val) in timings {
        if !val.is_finite() || *val <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: (*name).into(),
                message: format!("must be a positive number of seconds, got {val}"),
            });
        }
    }

    if t.pulse_interval_secs <= t.pulse_secs {
        return Err(ConfigError::ValidationError {
            field: "timing.pulse_interval_secs".into(),
            message: format!(
                "must exceed timing.pulse_secs ({}), got {}",
                t.pulse_secs, t.pulse_interval_secs
            ),
        });
    }

    Ok(())
}
