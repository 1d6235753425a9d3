// Configuration loading

use crate::kv::{FileKv, KvStore, UnavailableKv};
use crate::sqlite::SqliteKv;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, warn};

/// Which [`crate::kv::KvStore`] backs the task store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

impl Backend {
    /// Open this backend rooted at `dir`
    pub fn open(self, dir: &Path) -> Result<Box<dyn KvStore>> {
        let kv: Box<dyn KvStore> = match self {
            Backend::File => Box::new(FileKv::open(dir)?),
            Backend::Sqlite => Box::new(SqliteKv::open(dir)?),
        };
        debug!(backend = %self, dir = %dir.display(), "Opened backend");
        Ok(kv)
    }

    /// Open this backend, degrading to an [`UnavailableKv`] if it cannot be opened
    ///
    /// A corrupt or unreachable store then loads as empty and rejects writes
    /// instead of aborting the caller.
    pub fn open_or_unavailable(self, dir: &Path) -> Box<dyn KvStore> {
        match self.open(dir) {
            Ok(kv) => kv,
            Err(e) => {
                warn!(backend = %self, dir = %dir.display(), error = %format!("{:#}", e), "Failed to open backend, starting empty");
                Box::new(UnavailableKv::new(self.name(), &e))
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Settings read from `config.yaml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the persisted tasks
    pub data_dir: Option<PathBuf>,
    pub backend: Backend,
    /// trace, debug, info, warn or error
    pub log_level: Option<String>,
}

impl Config {
    /// Default config file location: `<config_dir>/taskboard/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskboard").join("config.yaml"))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        if let Some(level) = &config.log_level {
            parse_level(level)?;
        }
        Ok(config)
    }

    /// Resolved data directory: configured, else `<data_local_dir>/taskboard`
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("taskboard"))
                .ok_or_else(|| eyre!("Could not determine data directory; set data_dir in config")),
        }
    }

    pub fn log_level(&self) -> Result<Level> {
        match &self.log_level {
            Some(level) => parse_level(level),
            None => Ok(Level::WARN),
        }
    }
}

fn parse_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .map_err(|_| eyre!("Invalid log level: {} (expected trace, debug, info, warn or error)", level))
}
