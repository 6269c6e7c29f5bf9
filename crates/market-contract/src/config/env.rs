// crates/market-contract/src/config/env.rs
// ============================================================================
// Module: Contract Environment
// Description: Environment-backed configuration overrides.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 and empty values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;
use super::MAX_TIMEOUT_SECS;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for suite configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractEnv {
    /// Optional TOML config file path.
    ConfigPath,
    /// Optional market collection base URL.
    BaseUrl,
    /// Optional timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Optional run artifact root.
    RunRoot,
    /// Optional JSON-lines run log path.
    AuditLog,
}

impl ContractEnv {
    /// Every key, in documentation order.
    pub const ALL: [Self; 5] =
        [Self::ConfigPath, Self::BaseUrl, Self::TimeoutSeconds, Self::RunRoot, Self::AuditLog];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "MARKET_CONTRACT_CONFIG",
            Self::BaseUrl => "MARKET_CONTRACT_BASE_URL",
            Self::TimeoutSeconds => "MARKET_CONTRACT_TIMEOUT_SEC",
            Self::RunRoot => "MARKET_CONTRACT_RUN_ROOT",
            Self::AuditLog => "MARKET_CONTRACT_AUDIT_LOG",
        }
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Snapshot of the environment layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvOverrides {
    /// TOML config file path.
    pub config_path: Option<PathBuf>,
    /// Market collection base URL.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Run artifact root.
    pub run_root: Option<PathBuf>,
    /// JSON-lines run log path.
    pub audit_log: Option<PathBuf>,
}

impl EnvOverrides {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not valid UTF-8, is empty, or fails
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads values through `lookup`, which maps a variable name to its raw value.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not valid UTF-8, is empty, or fails
    /// validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let read = |key: ContractEnv| read_nonempty(key.as_str(), lookup(key.as_str()));
        let timeout = read(ContractEnv::TimeoutSeconds)?
            .map(|value| parse_timeout_seconds(ContractEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            config_path: read(ContractEnv::ConfigPath)?.map(PathBuf::from),
            base_url: read(ContractEnv::BaseUrl)?,
            timeout,
            run_root: read(ContractEnv::RunRoot)?.map(PathBuf::from),
            audit_log: read(ContractEnv::AuditLog)?.map(PathBuf::from),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a raw value as UTF-8.
fn decode_strict(name: &str, raw: Option<OsString>) -> Result<Option<String>, ConfigError> {
    raw.map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name} must be valid UTF-8")))
    })
}

/// Decodes a raw value and rejects empty values.
fn read_nonempty(name: &str, raw: Option<OsString>) -> Result<Option<String>, ConfigError> {
    match decode_strict(name, raw)? {
        Some(value) if value.trim().is_empty() => {
            Err(ConfigError::Invalid(format!("{name} must not be empty")))
        }
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric, zero, or too large.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
    }
    if secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid(format!("{name} must be at most {MAX_TIMEOUT_SECS}")));
    }
    Ok(Duration::from_secs(secs))
}
