//! Environment-style settings, read once at startup.
//!
//! `.env` in the working directory is honoured (loaded by `run()` through
//! `dotenvy` before this module is consulted). Malformed values never stop
//! the app: they fall back to the default and are logged at debug level.

use std::time::Duration;

pub const CAPTURE_DELAY_ENV: &str = "CAPTURE_DELAY_MS";
pub const DISABLE_TRAY_ENV: &str = "DISABLE_TRAY";

pub const DEFAULT_CAPTURE_DELAY_MS: u64 = 200;
pub const MAX_CAPTURE_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Pause between hiding the panel and grabbing the desktop.
    pub capture_delay: Duration,
    pub tray_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture_delay: Duration::from_millis(DEFAULT_CAPTURE_DELAY_MS),
            tray_enabled: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(CAPTURE_DELAY_ENV) {
            match parse_delay_ms(&raw) {
                Ok(ms) => settings.capture_delay = Duration::from_millis(ms),
                Err(e) => log::debug!("[CONFIG] {}: {}, using default", CAPTURE_DELAY_ENV, e),
            }
        }

        if let Some(raw) = lookup(DISABLE_TRAY_ENV) {
            match parse_flag(&raw) {
                Ok(disabled) => settings.tray_enabled = !disabled,
                Err(e) => log::debug!("[CONFIG] {}: {}, using default", DISABLE_TRAY_ENV, e),
            }
        }

        settings
    }
}

/// Parses a delay in milliseconds, capped at [`MAX_CAPTURE_DELAY_MS`].
pub fn parse_delay_ms(raw: &str) -> Result<u64, ConfigParseError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigParseError::NotANumber(raw.to_string()))?;
    if value < 0 {
        return Err(ConfigParseError::Negative(value));
    }
    Ok((value as u64).min(MAX_CAPTURE_DELAY_MS))
}

/// Parses a boolean-like flag: `1`/`true` and `0`/`false`, any case.
/// An empty value counts as unset, i.e. false.
pub fn parse_flag(raw: &str) -> Result<bool, ConfigParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "" | "0" | "false" => Ok(false),
        _ => Err(ConfigParseError::NotABoolean(raw.to_string())),
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigParseError {
    #[error("'{0}' is not an integer")]
    NotANumber(String),

    #[error("{0} is negative")]
    Negative(i64),

    #[error("'{0}' is not a boolean flag")]
    NotABoolean(String),
}
