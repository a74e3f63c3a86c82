//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument or environment variable (both arrive through
//!    [`ConfigOverrides`], the binaries wire them up with clap)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing TOML file is not an error: the host starts on defaults and says
//! so through [`log_config_source`]. A TOML file that exists but does not
//! parse is.
//!
//! Loading runs before logging is set up (the file carries the log level),
//! so [`load_toml_config`] itself logs nothing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "LXP_CONFIG";

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "lxp.toml";

/// Compiled defaults, used when neither overrides nor TOML provide a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind: IpAddr,
    pub port: u16,
    pub storage_root: PathBuf,
    pub temp_dir: PathBuf,
    pub cleanup_depth: u32,
    pub default_user_id: String,
    pub max_upload_bytes: usize,
    pub max_json_bytes: usize,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            storage_root: PathBuf::from("scorm-packages"),
            temp_dir: PathBuf::from("temp-uploads"),
            // Top-level files only; nested directories from a previous
            // upload survive unless this is raised.
            cleanup_depth: 0,
            default_user_id: "test-user".to_string(),
            max_upload_bytes: 512 * 1024 * 1024,
            max_json_bytes: 5 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub storage_root: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub cleanup_depth: Option<u32>,
    pub default_user_id: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub max_json_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub storage_root: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub cleanup_depth: Option<u32>,
    pub default_user_id: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub log_level: Option<String>,
}

/// Fully resolved host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Directory holding one extracted tree per course
    pub storage_root: PathBuf,
    /// Directory receiving uploaded archives before extraction
    pub temp_dir: PathBuf,
    /// How many directory levels re-upload cleanup descends (0 = top-level files)
    pub cleanup_depth: u32,
    /// User id the launcher falls back to when no `userId` query parameter is given
    pub default_user_id: String,
    pub max_upload_bytes: usize,
    pub max_json_bytes: usize,
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::resolve(&ConfigOverrides::default(), None)
    }
}

impl HostConfig {
    /// Merge overrides, TOML values and compiled defaults, highest priority first
    pub fn resolve(overrides: &ConfigOverrides, toml: Option<&TomlConfig>) -> Self {
        let defaults = CompiledDefaults::default();
        let file = toml.cloned().unwrap_or_default();

        Self {
            bind: overrides.bind.or(file.bind).unwrap_or(defaults.bind),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            storage_root: overrides
                .storage_root
                .clone()
                .or(file.storage_root)
                .unwrap_or(defaults.storage_root),
            temp_dir: overrides
                .temp_dir
                .clone()
                .or(file.temp_dir)
                .unwrap_or(defaults.temp_dir),
            cleanup_depth: overrides
                .cleanup_depth
                .or(file.cleanup_depth)
                .unwrap_or(defaults.cleanup_depth),
            default_user_id: overrides
                .default_user_id
                .clone()
                .or(file.default_user_id)
                .unwrap_or(defaults.default_user_id),
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            max_json_bytes: file.max_json_bytes.unwrap_or(defaults.max_json_bytes),
            log_level: overrides
                .log_level
                .clone()
                .or(file.logging.level)
                .unwrap_or(defaults.log_level),
        }
    }

    /// Reject values the host cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.default_user_id.trim().is_empty() {
            return Err(Error::Config("default_user_id must not be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than zero".to_string()));
        }
        if self.max_json_bytes == 0 {
            return Err(Error::Config("max_json_bytes must be greater than zero".to_string()));
        }
        if self.storage_root == self.temp_dir {
            return Err(Error::Config(format!(
                "storage_root and temp_dir must differ (both {})",
                self.storage_root.display()
            )));
        }
        Ok(())
    }

    /// Address the HTTP listener binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Pick the config file path: explicit argument, then `LXP_CONFIG`, then `./lxp.toml`
pub fn config_file_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load the TOML config file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(Some(config))
}

/// Report where configuration came from. Call once tracing is initialized.
pub fn log_config_source(path: &Path, toml: Option<&TomlConfig>) {
    match toml {
        Some(_) => info!("Loaded config file {}", path.display()),
        None => warn!("Config file {} not found, using defaults", path.display()),
    }
}
