//! Text Log Configuration
//!
//! Where the log folder lives and whether records are mirrored into SQLite.
//! Config file: ./textlog.toml or ~/.config/textlog/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LogError, Result};

/// Default log folder (relative to the working directory)
pub const DEFAULT_LOG_FOLDER: &str = "AppLog";

/// Default database file for the error table
pub const DEFAULT_DB_PATH: &str = "errors.db";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "textlog.toml";

/// Log folder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Folder holding one `YYYY_MM_DD.txt` file per day
    #[serde(default = "default_folder")]
    pub folder: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
        }
    }
}

fn default_folder() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FOLDER)
}

/// Error table settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Mirror every record into the `errors` table
    #[serde(default)]
    pub enabled: bool,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLogConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub table: TableConfig,
}

impl TextLogConfig {
    /// Config rooted at `folder` with no table
    pub fn with_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig {
                folder: folder.into(),
            },
            table: TableConfig::default(),
        }
    }

    /// Enable the error table at `path`
    pub fn with_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.table = TableConfig {
            enabled: true,
            path: path.into(),
        };
        self
    }

    /// Table path, if the table is enabled
    pub fn table_path(&self) -> Option<&Path> {
        self.table.enabled.then_some(self.table.path.as_path())
    }

    /// Get user config path: ~/.config/textlog/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("textlog").join("config.toml"))
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| LogError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| LogError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Find and load configuration
    ///
    /// Priority:
    /// 1. ./textlog.toml
    /// 2. User config (~/.config/textlog/config.toml)
    /// 3. Defaults
    pub fn discover() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load(&user_path);
            }
        }

        Ok(Self::default())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LogError::Config(format!("Failed to serialize configuration: {}", e)))
    }
}
