//! Bootstrap configuration and root folder resolution
//!
//! Configuration is split in two tiers:
//! 1. **TOML bootstrap**: root folder, port, logging, auth and upload limits
//! 2. **Database runtime**: values persisted in the `settings` table
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `CIVIC_ROOT_FOLDER` environment variable
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "CIVIC_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "civic.db";

/// Upload directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and uploaded media
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bearer token settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Media upload limits
    #[serde(default)]
    pub uploads: UploadConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Bearer token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; generated and stored in the database when absent
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Expected `iss` claim
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            issuer: default_issuer(),
        }
    }
}

/// Media upload limits for a single submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_total_bytes: default_max_total_bytes(),
        }
    }
}

pub const DEFAULT_PORT: u16 = 5780;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_issuer() -> String {
    "civic".to_string()
}

fn default_max_files() -> usize {
    5
}

fn default_max_total_bytes() -> usize {
    15 * 1024 * 1024
}

impl TomlConfig {
    /// Load configuration from an explicit path, or the platform default path
    ///
    /// A missing or unparsable file is not fatal: a warning is logged and
    /// compiled defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let Some(path) = path else {
            info!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Effective port (config value or compiled default)
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("civic").join("civic-sb.toml"))
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("civic"))
        .unwrap_or_else(|| PathBuf::from("./civic_data"))
}

/// Create the root folder and its uploads directory if missing
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root.join(UPLOADS_DIR))?;
    Ok(())
}

/// Database path inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

/// Uploads directory inside the root folder
pub fn uploads_path(root: &Path) -> PathBuf {
    root.join(UPLOADS_DIR)
}
