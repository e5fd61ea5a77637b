//! Configuration management
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. The user configuration file (`<config dir>/cdb/config.json`, or
//!    `$CDB_HOME/config.json`)
//! 3. Environment variables (`CDB_HOST`, `CDB_MAX_RETRIES`, `CDB_BACKOFF_MS`,
//!    `CDB_MODS_DIR`)
//!
//! The file is a flat JSON object using the same kebab-case keys:
//!
//! ```json
//! {
//!     "host": "https://content.minetest.net",
//!     "max-retries": 8,
//!     "backoff-ms": 2000,
//!     "timeout": 60,
//!     "mods-dir": "mods",
//!     "game-dirs": ["/home/user/.minetest"]
//! }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use cdb_pm::config::Config;
//!
//! let config = Config::build(true).unwrap();
//! println!("Installing into {:?}", config.mods_dir);
//! println!("Registry: {}", config.host);
//! ```

mod config;
mod source;

pub use config::Config;
pub use source::{ConfigLoader, ConfigSource, RawConfig};
