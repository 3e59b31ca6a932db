//! Configuration loading and output folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (`POLYECHO_CONFIG`, `POLYECHO_OUTPUT_DIR`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! Without a config file in the default location the compiled defaults
//! apply. A file named explicitly must exist.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "POLYECHO_CONFIG";

/// Environment variable naming the archive output folder
pub const OUTPUT_DIR_ENV_VAR: &str = "POLYECHO_OUTPUT_DIR";

/// How the stem collector treats a second payload under an existing name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last write wins, with a warning
    #[default]
    Overwrite,
    /// Second payload is refused with an error
    Reject,
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TomlConfig {
    /// Folder stem archives are written into
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Stem archive download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Upper bound on waiting for every stem payload
    pub timeout_secs: u64,

    pub duplicate_policy: DuplicatePolicy,

    /// Archive filename prefix, `<prefix>_<project>_<millis>.zip`
    pub archive_prefix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            duplicate_policy: DuplicatePolicy::Overwrite,
            archive_prefix: "ArborStems".to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Stem audio fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// HTTP gateway `ipfs://` URLs are rewritten onto
    pub ipfs_gateway: String,

    pub request_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ipfs_gateway: "https://ipfs.io/ipfs/".to_string(),
            request_timeout_secs: 30,
            user_agent: concat!("Polyecho/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Platform default config file, `~/.config/polyecho/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("polyecho").join("config.toml"))
}

/// Pick the TOML file to read: CLI argument, then environment, then the
/// platform default. Returns `None` when no candidate exists on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument (returned even if missing so the
    // caller reports the typo)
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: Platform default, only if present
    default_config_path().filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration, falling back to compiled defaults when no file exists
///
/// A file named on the command line or in `POLYECHO_CONFIG` must exist.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => Err(Error::Config(format!(
            "Config file {} not found",
            path.display()
        ))),
        None => {
            info!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the archive output folder
pub fn resolve_output_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(OUTPUT_DIR_ENV_VAR) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.output_dir {
        return path.clone();
    }

    // Priority 4: OS-dependent default
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
