//! Config persistence and path resolution for `Config`.
//!
//! Covers:
//! - `load_from` / `save_to` (YAML file I/O with atomic write)
//! - XDG-compliant path helpers (`config_path`, `config_dir`, `resolved_store_path`)

use super::Config;
use crate::error::ConfigError;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from `path`, writing the defaults there if it
    /// does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Config path: {:?}", path);

        if path.exists() {
            log::info!("Loading existing config from {:?}", path);
            let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
            let config: Config = if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_yaml_ng::from_str(&contents).map_err(ConfigError::from)?
            };
            config.validate()?;
            Ok(config)
        } else {
            log::info!("Config file not found, creating default at {:?}", path);
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            log::info!("Default config created successfully");
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        Ok(())
    }

    /// Get the configuration file path (using XDG convention)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("site-sentry")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // Use XDG convention on all platforms: ~/.config/site-sentry/
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("site-sentry")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Location of the key-value store, resolving `~` if present.
    ///
    /// Without an explicit `store_path`, the store lives next to the config
    /// file that was loaded.
    pub fn resolved_store_path(&self, config_dir: &Path) -> PathBuf {
        match self.store_path.as_deref() {
            Some(path) => expand_home(path),
            None => config_dir.join("storage.json"),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("config.yaml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert!(!path.with_extension("yaml.tmp").exists());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::new()
            .with_refresh_period_minutes(30)
            .with_store_path("/var/lib/site-sentry/storage.json");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "refresh_period_minutes: 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "refresh_period_minutes: [not, a, number]\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_resolved_store_path() {
        let base = Path::new("/etc/site-sentry");
        assert_eq!(
            Config::default().resolved_store_path(base),
            PathBuf::from("/etc/site-sentry/storage.json")
        );

        let config = Config::new().with_store_path("/tmp/s.json");
        assert_eq!(config.resolved_store_path(base), PathBuf::from("/tmp/s.json"));
    }
}
