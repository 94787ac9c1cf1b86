//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/synergia/config.toml` (or `SYNERGIA_CONFIG_DIR`)
//! 2. `./synergia.toml` (project-local)
//! 3. An explicit `--config` file
//! 4. Environment overrides (`CLERK_SECRET_KEY`, `SYNERGIA_DATABASE_PATH`, `SYNERGIA_BIND`)
//! 5. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SynergiaConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "synergia.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "synergia";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "SYNERGIA_CONFIG_DIR";

pub const SECRET_KEY_ENV: &str = "CLERK_SECRET_KEY";
pub const DATABASE_PATH_ENV: &str = "SYNERGIA_DATABASE_PATH";
pub const BIND_ENV: &str = "SYNERGIA_BIND";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: SynergiaConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., plaintext secrets).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>, explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None, explicit)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `SYNERGIA_CONFIG_DIR` and the platform default.
/// Discovered layers that fail to parse are skipped with a warning; an
/// `explicit` file must exist and parse.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = SynergiaConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
        sources.push(ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    if config.auth().has_plaintext_secret() {
        warnings.push(format!(
            "[auth] contains a plaintext clerk_secret_key. \
             Consider the {} environment variable instead.",
            SECRET_KEY_ENV
        ));
    }

    apply_env_overrides(&mut config);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<SynergiaConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SynergiaConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &SynergiaConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Get the user config file path.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for synergia.
///
/// Checks `SYNERGIA_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Apply environment overrides on top of file configuration.
pub fn apply_env_overrides(config: &mut SynergiaConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

fn apply_overrides(config: &mut SynergiaConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(key) = lookup(SECRET_KEY_ENV) {
        config.auth_mut().clerk_secret_key = Some(key);
    }
    if let Some(path) = lookup(DATABASE_PATH_ENV) {
        config.database_mut().path = PathBuf::from(path);
    }
    if let Some(bind) = lookup(BIND_ENV) {
        config.server_mut().bind = bind;
    }
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(config: &mut SynergiaConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    let loaded = match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            true
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            false
        }
    };
    ConfigSource {
        path: path.to_path_buf(),
        loaded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[auth]
cache_ttl_secs = 60
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.auth().cache_ttl_secs, 60);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
        assert_eq!(loaded.config.auth().cache_max_size, 1000);
    }

    #[test]
    fn test_layered_merge_order() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let extra = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[auth]
cache_max_size = 10

[database]
path = "user.db"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("synergia.toml"),
            r#"
[auth]
cache_max_size = 20
"#,
        )
        .unwrap();
        let explicit = extra.path().join("override.toml");
        fs::write(
            &explicit,
            r#"
[logging]
file_enabled = false
"#,
        )
        .unwrap();

        let loaded = load_config_with_options(
            Some(project.path()),
            Some(user.path()),
            Some(&explicit),
        )
        .unwrap();

        assert_eq!(loaded.loaded_from().len(), 3);
        assert_eq!(loaded.config.auth().cache_max_size, 20);
        assert!(!loaded.config.logging().file_enabled);
    }

    #[test]
    fn test_malformed_layer_warns_but_continues() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("synergia.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let missing = project.path().join("nope.toml");

        let err = load_config_with_options(Some(project.path()), Some(user.path()), Some(&missing))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_plaintext_secret_warning() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("synergia.toml"),
            r#"
[auth]
clerk_secret_key = "sk_live_abc"
"#,
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert!(loaded.warnings.iter().any(|w| w.contains("plaintext")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (SECRET_KEY_ENV, "sk_env"),
            (DATABASE_PATH_ENV, "/tmp/env.db"),
            (BIND_ENV, "0.0.0.0:9999"),
        ]
        .into_iter()
        .collect();

        let mut config = SynergiaConfig::new();
        apply_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.auth().clerk_secret_key.as_deref(), Some("sk_env"));
        assert_eq!(config.database().path, PathBuf::from("/tmp/env.db"));
        assert_eq!(config.server().bind, "0.0.0.0:9999");
        // Untouched fields keep their defaults.
        assert_eq!(config.auth().cache_max_size, 1000);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = SynergiaConfig::new();
        apply_overrides(&mut config, |_| Some(String::new()));
        assert!(config.auth.is_none());
        assert!(config.server.is_none());
    }
}
