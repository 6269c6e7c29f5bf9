// crates/market-contract/src/config/mod.rs
// ============================================================================
// Module: Contract Configuration
// Description: Layered configuration for suite runs.
// Purpose: Resolve base URL, timeout, and output paths with strict validation.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! Configuration is layered, later sources overriding earlier ones: built-in
//! defaults, an optional TOML file, environment variables, then explicit
//! overrides (CLI flags). The merged result is validated and normalized
//! before use; invalid input fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::ContractEnv;
pub use env::EnvOverrides;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default market collection base URL.
pub const DEFAULT_BASE_URL: &str = "https://api-desafio-qa.onrender.com/mercado";
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Largest accepted per-request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 600;
/// Largest accepted config file in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Resolved suite configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    /// Market collection base URL, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory for run artifacts; `None` uses a timestamped default.
    pub run_root: Option<PathBuf>,
    /// JSON-lines run log file.
    pub audit_log: Option<PathBuf>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            run_root: None,
            audit_log: None,
        }
    }
}

/// On-disk TOML configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Market collection base URL.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_sec: Option<u64>,
    /// Directory for run artifacts.
    pub run_root: Option<PathBuf>,
    /// JSON-lines run log file.
    pub audit_log: Option<PathBuf>,
}

/// Explicit overrides, typically CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Config file path; falls back to the environment when unset.
    pub config_path: Option<PathBuf>,
    /// Market collection base URL.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_sec: Option<u64>,
    /// Directory for run artifacts.
    pub run_root: Option<PathBuf>,
    /// JSON-lines run log file.
    pub audit_log: Option<PathBuf>,
}

impl ContractConfig {
    /// Loads configuration from every layer and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer is unreadable or invalid.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let env = EnvOverrides::load()?;
        Self::resolve(&env, overrides)
    }

    /// Merges the given environment snapshot and overrides onto defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer is unreadable or invalid.
    pub fn resolve(env: &EnvOverrides, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let file_path = overrides.config_path.as_ref().or(env.config_path.as_ref());
        if let Some(path) = file_path {
            config.apply_file(&ConfigFile::load(path)?)?;
        }
        config.apply_env(env);
        config.apply_overrides(overrides)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies values from a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an invalid timeout.
    pub fn apply_file(&mut self, file: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(base_url) = &file.base_url {
            self.base_url.clone_from(base_url);
        }
        if let Some(secs) = file.timeout_sec {
            self.timeout = timeout_from_secs("timeout_sec", secs)?;
        }
        if let Some(run_root) = &file.run_root {
            self.run_root = Some(run_root.clone());
        }
        if let Some(audit_log) = &file.audit_log {
            self.audit_log = Some(audit_log.clone());
        }
        Ok(())
    }

    /// Applies values from the environment snapshot.
    pub fn apply_env(&mut self, env: &EnvOverrides) {
        if let Some(base_url) = &env.base_url {
            self.base_url.clone_from(base_url);
        }
        if let Some(timeout) = env.timeout {
            self.timeout = timeout;
        }
        if let Some(run_root) = &env.run_root {
            self.run_root = Some(run_root.clone());
        }
        if let Some(audit_log) = &env.audit_log {
            self.audit_log = Some(audit_log.clone());
        }
    }

    /// Applies explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an invalid timeout.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(base_url) = &overrides.base_url {
            self.base_url.clone_from(base_url);
        }
        if let Some(secs) = overrides.timeout_sec {
            self.timeout = timeout_from_secs("--timeout-sec", secs)?;
        }
        if let Some(run_root) = &overrides.run_root {
            self.run_root = Some(run_root.clone());
        }
        if let Some(audit_log) = &overrides.audit_log {
            self.audit_log = Some(audit_log.clone());
        }
        Ok(())
    }

    /// Validates the configuration and normalizes the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is out of bounds.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.base_url = normalize_base_url(&self.base_url)?;
        let secs = self.timeout.as_secs();
        if secs == 0 || secs > MAX_TIMEOUT_SECS || self.timeout.subsec_nanos() != 0 {
            return Err(ConfigError::Invalid(format!(
                "timeout must be a whole number of seconds between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        if self.run_root.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("run_root must not be empty".to_string()));
        }
        if self.audit_log.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("audit_log must not be empty".to_string()));
        }
        Ok(())
    }
}

impl ConfigFile {
    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, too large, not
    /// UTF-8, or not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a seconds value into a bounded timeout.
fn timeout_from_secs(name: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid(format!(
            "{name} must be between 1 and {MAX_TIMEOUT_SECS} seconds"
        )));
    }
    Ok(Duration::from_secs(secs))
}

/// Validates a base URL and strips trailing slashes.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for unparseable URLs, non-HTTP schemes,
/// embedded credentials, queries, or fragments.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| ConfigError::Invalid(format!("base_url is not a valid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid("base_url must use http or https".to_string()));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid("base_url must include a host".to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid("base_url must not embed credentials".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid(
            "base_url must not carry a query or fragment".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
