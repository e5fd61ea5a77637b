use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::source::{ConfigLoader, ConfigSource, RawConfig};
use crate::error::{ContentDbError, Result};
use crate::http::{
    HttpClientConfig, DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES,
    DEFAULT_USER_AGENT,
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODS_DIR: &str = "mods";

/// Resolved cdb configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry base URL
    pub host: String,
    pub max_retries: u32,
    /// Linear backoff step between retries
    pub backoff_factor: Duration,
    /// Whole-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Install root for new packages
    pub mods_dir: PathBuf,
    /// Game directories searched when looking up installed mods
    pub game_dirs: Vec<PathBuf>,

    sources: HashMap<String, ConfigSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            mods_dir: PathBuf::from(DEFAULT_MODS_DIR),
            game_dirs: default_game_dirs(),
            sources: HashMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build configuration from defaults, the user config file and the
    /// environment, later sources winning.
    pub fn build(use_environment: bool) -> Result<Self> {
        Self::build_from(None::<&Path>, use_environment)
    }

    /// Like [`Config::build`], reading `config_file` instead of the user
    /// configuration file when given.
    pub fn build_from<P: AsRef<Path>>(config_file: Option<P>, use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);
        let mut config = Self::default();

        for key in Self::config_keys() {
            config.sources.insert(key.to_string(), ConfigSource::Default);
        }

        // 1. Config file
        let path = match config_file {
            Some(path) => path.as_ref().to_path_buf(),
            None => loader.global_config_path(),
        };
        let raw = loader.load_config_file(&path)?;
        config.merge_raw_config(raw, ConfigSource::File(path))?;

        // 2. Environment variable overrides
        if use_environment {
            config.apply_env_overrides(&loader);
        }

        Ok(config)
    }

    /// Get the source of a configuration value
    pub fn get_source(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    /// Override the install root, as done by `--mods-dir`
    pub fn set_mods_dir<P: AsRef<Path>>(&mut self, mods_dir: P) {
        self.mods_dir = mods_dir.as_ref().to_path_buf();
        self.sources.insert("mods-dir".to_string(), ConfigSource::Command);
    }

    /// HTTP settings for the registry client
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::new()
            .with_base_url(self.host.clone())
            .with_max_retries(self.max_retries)
            .with_backoff_factor(self.backoff_factor)
            .with_timeout(self.timeout)
            .with_user_agent(self.user_agent.clone())
    }

    fn merge_raw_config(&mut self, raw: RawConfig, source: ConfigSource) -> Result<()> {
        for (key, value) in raw.values {
            self.merge_config_value(&key, value, source.clone())?;
        }
        Ok(())
    }

    fn merge_config_value(
        &mut self,
        key: &str,
        value: serde_json::Value,
        source: ConfigSource,
    ) -> Result<()> {
        match key {
            "host" => {
                self.host = expect_str(key, &value)?.to_string();
            }
            "max-retries" => {
                self.max_retries = expect_u32(key, &value)?;
            }
            "backoff-ms" => {
                self.backoff_factor = Duration::from_millis(expect_u64(key, &value)?);
            }
            "timeout" => {
                self.timeout = Duration::from_secs(expect_u64(key, &value)?);
            }
            "user-agent" => {
                self.user_agent = expect_str(key, &value)?.to_string();
            }
            "mods-dir" => {
                self.mods_dir = PathBuf::from(expect_str(key, &value)?);
            }
            "game-dirs" => {
                let dirs = value
                    .as_array()
                    .ok_or_else(|| invalid(key, "an array of paths"))?;
                self.game_dirs = dirs
                    .iter()
                    .map(|d| d.as_str().map(PathBuf::from).ok_or_else(|| invalid(key, "an array of paths")))
                    .collect::<Result<Vec<_>>>()?;
            }
            _ => {
                log::debug!("Ignoring unknown configuration key {:?}", key);
                return Ok(());
            }
        }

        self.sources.insert(key.to_string(), source);
        Ok(())
    }

    fn apply_env_overrides(&mut self, loader: &ConfigLoader) {
        if let Some(host) = loader.get_env_config("host") {
            self.host = host;
            self.mark_env("host");
        }

        if let Some(retries) = loader.get_env_u64("max-retries") {
            self.max_retries = u32::try_from(retries).unwrap_or(u32::MAX);
            self.mark_env("max-retries");
        }

        if let Some(ms) = loader.get_env_u64("backoff-ms") {
            self.backoff_factor = Duration::from_millis(ms);
            self.mark_env("backoff-ms");
        }

        if let Some(mods_dir) = loader.get_env_path("mods-dir") {
            self.mods_dir = mods_dir;
            self.mark_env("mods-dir");
        }
    }

    fn mark_env(&mut self, key: &str) {
        self.sources.insert(
            key.to_string(),
            ConfigSource::Environment(ConfigLoader::env_var_name(key)),
        );
    }

    fn config_keys() -> &'static [&'static str] {
        &[
            "host",
            "max-retries",
            "backoff-ms",
            "timeout",
            "user-agent",
            "mods-dir",
            "game-dirs",
        ]
    }
}

fn default_game_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(base) = directories::BaseDirs::new() {
        dirs.push(base.home_dir().join(".minetest"));
    }
    dirs.push(PathBuf::from("/usr/share/minetest"));
    dirs
}

fn invalid(key: &str, expected: &str) -> ContentDbError {
    ContentDbError::Config(format!("\"{}\" must be {}", key, expected))
}

fn expect_str<'a>(key: &str, value: &'a serde_json::Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| invalid(key, "a string"))
}

fn expect_u64(key: &str, value: &serde_json::Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| invalid(key, "a non-negative integer"))
}

fn expect_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    u32::try_from(expect_u64(key, value)?).map_err(|_| invalid(key, "a 32-bit integer"))
}
