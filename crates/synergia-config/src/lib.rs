//! Configuration system for the Synergia chat backend.
//!
//! Provides TOML-based configuration with:
//! - Config file layering (user config dir + project-local `synergia.toml`)
//! - An optional explicit config file on top
//! - Environment overrides for secrets and deployment knobs
//! - Validation of cache bounds and the bind address

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    apply_env_overrides, load_config, load_config_file, load_config_with_options, save_config,
    xdg_config_dir, xdg_config_path, ConfigSource, LoadedConfig, BIND_ENV, DATABASE_PATH_ENV,
    SECRET_KEY_ENV,
};
pub use error::{ConfigError, Result};
pub use types::*;
