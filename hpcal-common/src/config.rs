//! Configuration loading and resolution
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error. Missing required database settings
//! after resolution are.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5800";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_DB_HOST: &str = "HPCALIB_DB_HOST";
pub const ENV_DB_PORT: &str = "HPCALIB_DB_PORT";
pub const ENV_DB_USER: &str = "HPCALIB_DB_USER";
pub const ENV_DB_PASS: &str = "HPCALIB_DB_PASS";
pub const ENV_DB_NAME: &str = "HPCALIB_DB_NAME";

/// Partially specified catalog database settings from one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl DatabaseSettings {
    /// Settings from `HPCALIB_DB_*` environment variables
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let port = match var(ENV_DB_PORT) {
            Some(text) => Some(text.parse::<u16>().map_err(|_| {
                Error::Config(format!("{} is not a valid port: {:?}", ENV_DB_PORT, text))
            })?),
            None => None,
        };

        Ok(Self {
            host: var(ENV_DB_HOST),
            port,
            user: var(ENV_DB_USER),
            password: var(ENV_DB_PASS),
            name: var(ENV_DB_NAME),
        })
    }

    /// Fill unset fields from a lower-priority source
    pub fn or(self, fallback: DatabaseSettings) -> Self {
        Self {
            host: self.host.or(fallback.host),
            port: self.port.or(fallback.port),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            name: self.name.or(fallback.name),
        }
    }

    /// Final connection settings; host, user and database name are required
    pub fn resolve(self) -> Result<DatabaseConfig> {
        let require = |value: Option<String>, what: &str, env: &str| {
            value.ok_or_else(|| {
                Error::Config(format!(
                    "Catalog database {} not configured (set {} or [database] in config.toml)",
                    what, env
                ))
            })
        };

        Ok(DatabaseConfig {
            host: require(self.host, "host", ENV_DB_HOST)?,
            port: self.port.unwrap_or(DEFAULT_DB_PORT),
            user: require(self.user, "user", ENV_DB_USER)?,
            password: self.password.unwrap_or_default(),
            name: require(self.name, "name", ENV_DB_NAME)?,
        })
    }
}

/// Resolved catalog database connection settings
#[derive(Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

/// `[lightcurves]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightcurveSettings {
    /// Full connection URL of the light-curve index database
    pub url: Option<String>,
    /// Table holding `Gaia_DR2_ID` / `path_to_file` rows
    pub table: Option<String>,
}

/// `[server]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: Option<String>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database: DatabaseSettings,
    pub lightcurves: LightcurveSettings,
    pub server: ServerSettings,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Platform config file locations, most specific first
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("hpcal").join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc/hpcal/config.toml"));
    }
    candidates
}

/// Load the TOML config and report which file it came from.
///
/// An explicitly requested file must exist. Otherwise the first existing
/// platform candidate is used, and defaults apply when there is none
/// (source `None`). Nothing is logged here: callers usually load config
/// before their subscriber exists, so they report the source themselves.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok((read_toml_config(path)?, Some(path.to_path_buf())));
    }

    match config_file_candidates().into_iter().find(|p| p.exists()) {
        Some(path) => Ok((read_toml_config(&path)?, Some(path))),
        None => Ok((TomlConfig::default(), None)),
    }
}

fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    TomlConfig::parse(&content)
}
