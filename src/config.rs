//! Configuration Module - Limits and timeouts from ~/.extguard/config.toml
//!
//! Supports:
//! - Per-file and per-request limits
//! - Policy lookup and persistence timeouts
//! - Scratch directory for files under inspection

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signature::HEADER_INSPECT_LIMIT;

/// extguard configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Upload limits
    pub limits: LimitsConfig,
    /// Policy lookup settings
    pub policy: PolicyConfig,
    /// Upload pipeline settings
    pub upload: UploadConfig,
    /// Scratch file settings
    pub scratch: ScratchConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Limits applied before any content is inspected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of one file in bytes
    pub max_file_size: u64,
    /// Maximum filename length in characters
    pub max_filename_len: usize,
    /// Maximum files per batch request
    pub max_batch_files: usize,
    /// Leading bytes read back from the scratch file for detection
    pub header_inspect_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_filename_len: 255,
            max_batch_files: 5,
            header_inspect_bytes: HEADER_INSPECT_LIMIT,
        }
    }
}

/// Policy lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Upper bound on a single blacklist read
    pub lookup_timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 5_000,
        }
    }
}

impl PolicyConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Upload pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Files of one batch validated at the same time
    pub concurrency: usize,
    /// Upper bound on saving one upload record
    pub persist_timeout_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            persist_timeout_ms: 10_000,
        }
    }
}

impl UploadConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

/// Scratch file settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Directory for files under inspection (None = OS temp dir)
    pub dir: Option<PathBuf>,
}

impl ScratchConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    /// Load config from default path or return defaults
    pub fn load() -> Self {
        Self::load_from(&Self::default_path()).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "extguard", "extguard")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".extguard")
                    .join("config.toml")
            })
    }

    /// Write the commented sample config to `path` unless a file is already
    /// there. Returns whether a file was created.
    pub fn init_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, generate_sample_config())
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        tracing::info!("Created default config at {}", path.display());
        Ok(true)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.max_file_size == 0 {
            return Err(ConfigError::Zero {
                field: "limits.max_file_size",
            });
        }
        if limits.max_filename_len == 0 {
            return Err(ConfigError::Zero {
                field: "limits.max_filename_len",
            });
        }
        if limits.max_batch_files == 0 {
            return Err(ConfigError::Zero {
                field: "limits.max_batch_files",
            });
        }
        if limits.header_inspect_bytes == 0 {
            return Err(ConfigError::Zero {
                field: "limits.header_inspect_bytes",
            });
        }
        if limits.header_inspect_bytes > HEADER_INSPECT_LIMIT {
            return Err(ConfigError::OutOfRange {
                field: "limits.header_inspect_bytes",
                value: limits.header_inspect_bytes as u64,
                max: HEADER_INSPECT_LIMIT as u64,
            });
        }
        if self.policy.lookup_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "policy.lookup_timeout_ms",
            });
        }
        if self.upload.concurrency == 0 {
            return Err(ConfigError::Zero {
                field: "upload.concurrency",
            });
        }
        if self.upload.persist_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "upload.persist_timeout_ms",
            });
        }
        Ok(())
    }
}

/// Generate a sample config file with comments
pub fn generate_sample_config() -> String {
    r#"# extguard Configuration
# Location: ~/.extguard/config.toml (or %APPDATA%\extguard\config.toml on Windows)

[general]
# Log level: trace, debug, info, warn, error
log_level = "info"

[limits]
# Maximum size of one file in bytes (10 MiB)
max_file_size = 10485760

# Maximum filename length in characters
max_filename_len = 255

# Maximum files per upload request
max_batch_files = 5

# Leading bytes inspected for magic numbers (at most 65536)
header_inspect_bytes = 65536

[policy]
# Give up on a blacklist lookup after this many milliseconds.
# A failed or stalled lookup rejects the file; it is never waved through.
lookup_timeout_ms = 5000

[upload]
# Files of one request validated at the same time
concurrency = 5

# Give up on saving an upload record after this many milliseconds
persist_timeout_ms = 10000

[scratch]
# Directory for files under inspection (default: OS temp dir)
# dir = "/var/tmp/extguard"
"#
    .to_string()
}
