//! Centralized logging configuration for jkm
//!
//! The terminal UI owns stdout and stderr, so log output goes to a file
//! (JSON lines by default) or nowhere at all.
//!
//! # Examples
//!
//! ```no_run
//! use libjkm::logging::{LogFormat, LogTarget, LoggingConfig};
//!
//! let config = LoggingConfig::new(
//!     LogFormat::Json,
//!     "debug".to_string(),
//!     LogTarget::File("jkm.logs.jsonl".into()),
//! );
//! config.init().expect("log file should be writable");
//!
//! // Or read JKM_LOGGING, JKM_LOG_FILE, JKM_LOG_FORMAT and JKM_LOG_LEVEL
//! let from_env = LoggingConfig::from_lookup(|key| std::env::var(key).ok());
//! from_env.init().expect("log file should be writable");
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

pub const DEFAULT_LOG_FILE: &str = "jkm.logs.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Multi-line pretty output (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Where log records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Disabled,
    File(PathBuf),
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub target: LogTarget,
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Log output format (text, json, or pretty)
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `target` - Log file, or disabled
    pub fn new(format: LogFormat, level: String, target: LogTarget) -> Self {
        Self {
            format,
            level,
            target,
        }
    }

    /// Build a configuration from `JKM_*` variables via `lookup`
    ///
    /// Logging is enabled when `JKM_LOGGING` is set to anything but `false`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("JKM_LOGGING")
            .map(|v| !v.is_empty() && v != "false")
            .unwrap_or(false);

        let target = if enabled {
            let path = lookup("JKM_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
            LogTarget::File(PathBuf::from(shellexpand::tilde(&path).to_string()))
        } else {
            LogTarget::Disabled
        };

        let format = lookup("JKM_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(LogFormat::Json);

        let level = lookup("JKM_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Self::new(format, level, target)
    }

    /// Initialize logging with the configured settings
    ///
    /// Call once at startup. A second initialization is ignored rather than
    /// panicking. Fails only when the log file cannot be opened.
    pub fn init(&self) -> std::io::Result<()> {
        use tracing_subscriber::EnvFilter;

        let path = match &self.target {
            LogTarget::Disabled => return Ok(()),
            LogTarget::File(path) => path,
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = Mutex::new(file);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!("logging already initialized");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_from_str_invalid() {
        let result = "xml".parse::<LogFormat>();
        assert!(result.unwrap_err().contains("Invalid log format: 'xml'"));
    }

    #[test]
    fn test_log_format_display() {
        assert_eq!(LogFormat::Text.to_string(), "text");
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
    }

    #[test]
    fn test_logging_disabled_by_default() {
        let config = LoggingConfig::from_lookup(lookup(&[]));
        assert_eq!(config.target, LogTarget::Disabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_logging_false_stays_disabled() {
        let config = LoggingConfig::from_lookup(lookup(&[("JKM_LOGGING", "false")]));
        assert_eq!(config.target, LogTarget::Disabled);
    }

    #[test]
    fn test_logging_enabled_uses_default_file() {
        let config = LoggingConfig::from_lookup(lookup(&[
            ("JKM_LOGGING", "true"),
            ("JKM_LOG_LEVEL", "debug"),
            ("JKM_LOG_FORMAT", "text"),
        ]));
        assert_eq!(config.target, LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE)));
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn test_disabled_init_is_noop() {
        let config = LoggingConfig::new(LogFormat::Text, "info".to_string(), LogTarget::Disabled);
        assert!(config.init().is_ok());
    }
}
