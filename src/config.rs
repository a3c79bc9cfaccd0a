use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default registry cache lifetime in milliseconds (24 hours)
pub const DEFAULT_CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Delay between starting each fetch request to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Project-level configuration file
pub const CONFIG_FILE_NAME: &str = ".dep-compat.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// dep-compat configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Custom rules file; relative paths resolve against the config file
    pub rules_path: Option<PathBuf>,
    /// Node.js version to check against instead of detecting `node`
    pub node_version: Option<String>,
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    /// Directory of the config file this was read from
    #[serde(skip)]
    source_dir: Option<PathBuf>,
}

/// Registry-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub enabled: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            enabled: true,
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Cache entry lifetime in milliseconds
    pub ttl_ms: i64,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            enabled: true,
        }
    }
}

impl Config {
    /// Load configuration for a project.
    ///
    /// An explicit path must exist. Otherwise `.dep-compat.json` in the
    /// project directory is used when present, and defaults when not.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = project_dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    debug!("No {} in {:?}, using defaults", CONFIG_FILE_NAME, project_dir);
                    return Ok(Self::default());
                }
                candidate
            }
        };

        Self::from_file(&path)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading config from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;
        config.source_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// `rules_path` resolved against the directory of the config file
    pub fn resolved_rules_path(&self) -> Option<PathBuf> {
        let rules_path = self.rules_path.as_ref()?;
        match &self.source_dir {
            Some(dir) if rules_path.is_relative() => Some(dir.join(rules_path)),
            _ => Some(rules_path.clone()),
        }
    }
}

/// Returns the path to the data directory for dep-compat.
/// Uses $XDG_DATA_HOME/dep-compat if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/dep-compat,
/// or ./dep-compat if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the registry cache database.
pub fn db_path() -> PathBuf {
    data_dir().join("registry.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("dep-compat")
}
