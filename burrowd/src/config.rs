//! Host configuration
//!
//! Settings come from defaults, then an optional JSON file given with
//! `--config`, then individual command-line flags, in that order.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

/// Native host settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Period of the main-thread heartbeat
    pub heartbeat_ms: u64,
    /// Sleep between stdin reads
    pub input_poll_ms: u64,
    /// File watched for changes, if any
    pub watch_path: Option<PathBuf>,
    pub watch_interval_ms: u64,
    /// Put the terminal in raw mode while running
    pub raw_mode: bool,
    /// Default filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Byte script replayed instead of reading stdin
    pub script: Option<PathBuf>,
    /// Stop after this many heartbeats (0 = unlimited)
    pub max_heartbeats: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: 1000,
            input_poll_ms: 10,
            watch_path: None,
            watch_interval_ms: 500,
            raw_mode: true,
            log_level: "info".to_string(),
            script: None,
            max_heartbeats: 0,
        }
    }
}

impl HostConfig {
    /// Loads a JSON config file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(HostConfig),
    Help,
}

/// Parses `args` (program name first) into a configuration
pub fn parse_args(args: &[String]) -> Result<Invocation, ConfigError> {
    let mut config = match config_path(args)? {
        Some(path) => HostConfig::from_file(Path::new(path))?,
        None => HostConfig::default(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
            }
            "--heartbeat-ms" => {
                i += 1;
                config.heartbeat_ms = number(args, i, "--heartbeat-ms")?;
            }
            "--max-heartbeats" => {
                i += 1;
                config.max_heartbeats = number(args, i, "--max-heartbeats")?;
            }
            "--watch" | "-w" => {
                i += 1;
                config.watch_path = Some(PathBuf::from(value(args, i, "--watch")?));
            }
            "--script" | "-s" => {
                i += 1;
                config.script = Some(PathBuf::from(value(args, i, "--script")?));
            }
            "--log-level" | "-l" => {
                i += 1;
                config.log_level = value(args, i, "--log-level")?.to_string();
            }
            "--no-raw" => {
                config.raw_mode = false;
            }
            "--help" | "-h" => return Ok(Invocation::Help),
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        i += 1;
    }

    config.level_filter()?;
    Ok(Invocation::Run(config))
}

fn config_path(args: &[String]) -> Result<Option<&str>, ConfigError> {
    match args.iter().position(|arg| arg == "--config" || arg == "-c") {
        Some(at) => value(args, at + 1, "--config").map(Some),
        None => Ok(None),
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, ConfigError> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn number(args: &[String], i: usize, flag: &str) -> Result<u64, ConfigError> {
    let raw = value(args, i, flag)?;
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: raw.to_string(),
    })
}

/// Usage text for `--help` and argument errors
pub fn usage(program: &str) -> String {
    let mut text = format!("Usage: {} [OPTIONS]\n\n", program);
    text.push_str("Options:\n");
    text.push_str("  -c, --config <FILE>      JSON configuration file\n");
    text.push_str("  --heartbeat-ms <N>       Heartbeat period in milliseconds (default 1000)\n");
    text.push_str("  --max-heartbeats <N>     Stop after N heartbeats (0 = unlimited)\n");
    text.push_str("  -w, --watch <PATH>       Log whenever PATH changes\n");
    text.push_str("  -s, --script <FILE>      Replay a byte script instead of reading stdin\n");
    text.push_str("  -l, --log-level <LEVEL>  off, error, warn, info, debug or trace\n");
    text.push_str("  --no-raw                 Leave the terminal in cooked mode\n");
    text.push_str("  -h, --help               Show this help message\n");
    text
}
