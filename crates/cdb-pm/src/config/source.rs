use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{ContentDbError, Result};

/// Represents the source of a configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default built-in value
    Default,
    /// From a configuration file
    File(PathBuf),
    /// From environment variable
    Environment(String),
    /// Programmatically set (command line flags)
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> &str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::File(_) => "file",
            ConfigSource::Environment(var) => var,
            ConfigSource::Command => "command",
        }
    }
}

/// Raw configuration data as stored in `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(flatten)]
    pub values: IndexMap<String, serde_json::Value>,
}

/// Loads configuration from files and the environment
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a CDB_* environment variable, empty values ignored
    pub fn get_cdb_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Directory holding the user configuration
    pub fn get_config_home(&self) -> PathBuf {
        if let Some(home) = self.get_cdb_env("CDB_HOME") {
            return PathBuf::from(home);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "cdb") {
            proj_dirs.config_dir().to_path_buf()
        } else if let Some(base) = directories::BaseDirs::new() {
            base.home_dir().join(".cdb")
        } else {
            PathBuf::from(".cdb")
        }
    }

    /// Path of the user configuration file
    pub fn global_config_path(&self) -> PathBuf {
        self.get_config_home().join("config.json")
    }

    /// Load configuration from a JSON file; a missing file is empty
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ContentDbError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ContentDbError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the user configuration file
    pub fn load_global_config(&self) -> Result<RawConfig> {
        self.load_config_file(self.global_config_path())
    }

    /// Environment variable name for a key: "mods-dir" -> "CDB_MODS_DIR"
    pub fn env_var_name(key: &str) -> String {
        format!("CDB_{}", key.replace('-', "_").to_uppercase())
    }

    /// Get a configuration value from its environment variable
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        self.get_cdb_env(&Self::env_var_name(key))
    }

    /// Get unsigned integer value from environment variable
    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        let raw = self.get_env_config(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring {}={:?}: not a number", Self::env_var_name(key), raw);
                None
            }
        }
    }

    /// Get a path value from environment variable
    pub fn get_env_path(&self, key: &str) -> Option<PathBuf> {
        self.get_env_config(key).map(PathBuf::from)
    }
}
