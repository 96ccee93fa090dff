//! Configuration management for jkm
//!
//! Settings come from an optional TOML file, then environment variables
//! (`JKM_*`) override individual fields. A missing file is fine: the client
//! starts in setup mode and asks for whatever is still blank.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_REFRESH_SECS: u64 = 3;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub imap_server: String,
    pub imap_port: u16,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub email_address: String,
    pub imap_password: String,
    pub smtp_password: String,
    /// Seconds between background list refreshes
    pub refresh_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            imap_server: String::new(),
            imap_port: DEFAULT_IMAP_PORT,
            smtp_server: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            email_address: String::new(),
            imap_password: String::new(),
            smtp_password: String::new(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(secret: &str) -> &'static str {
            if secret.is_empty() {
                ""
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Config")
            .field("imap_server", &self.imap_server)
            .field("imap_port", &self.imap_port)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("email_address", &self.email_address)
            .field("imap_password", &redact(&self.imap_password))
            .field("smtp_password", &redact(&self.smtp_password))
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from the default location, then apply `JKM_*` overrides
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, then apply `JKM_*` overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        tracing::info!(path = %path.display(), complete = config.is_complete(), "configuration loaded");
        Ok(config)
    }

    /// Parse the TOML file at `path`; a missing file yields the defaults
    pub fn read_file(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::ReadError(e).into()),
        };
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply overrides from a `JKM_*` key lookup
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a value from the file.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(val) = get("JKM_EMAIL") {
            self.email_address = val;
        }
        if let Some(val) = get("JKM_IMAP_SERVER") {
            self.imap_server = val;
        }
        if let Some(val) = get("JKM_IMAP_PORT") {
            self.imap_port = parse_number("JKM_IMAP_PORT", &val)?;
        }
        if let Some(val) = get("JKM_IMAP_PASSWORD") {
            self.imap_password = val;
        }
        if let Some(val) = get("JKM_SMTP_SERVER") {
            self.smtp_server = val;
        }
        if let Some(val) = get("JKM_SMTP_PORT") {
            self.smtp_port = parse_number("JKM_SMTP_PORT", &val)?;
        }
        if let Some(val) = get("JKM_SMTP_PASSWORD") {
            self.smtp_password = val;
        }
        if let Some(val) = get("JKM_REFRESH_SECS") {
            self.refresh_interval_secs = parse_number("JKM_REFRESH_SECS", &val)?;
        }
        Ok(())
    }

    /// Whether the connection fields needed to reach the mailbox are present
    pub fn is_complete(&self) -> bool {
        !self.imap_server.is_empty()
            && !self.email_address.is_empty()
            && !self.imap_password.is_empty()
    }

    /// SMTP credential, falling back to the IMAP one
    pub fn smtp_password_or_imap(&self) -> &str {
        if self.smtp_password.is_empty() {
            &self.imap_password
        } else {
            &self.smtp_password
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        tracing::error!(field, value, "invalid numeric configuration value");
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Resolve the configuration file path following the XDG Base Directory layout
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("JKM_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("jkm").join("config.toml"))
}
