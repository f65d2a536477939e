//! YAML configuration I/O
//!
//! Generic load/save for any serde configuration type, plus the standard
//! location of rill configuration files.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Load configuration from a YAML file
///
/// A missing file yields `T::default()`. A file that exists but cannot be
/// read or parsed also yields the default, with a logged warning.
///
/// ```ignore
/// let config: PlaybackConfig = load_config(Path::new("playback.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: Failed to read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: Loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: Failed to parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Saved {:?}", path);
    Ok(())
}

/// `<user config dir>/rill/<filename>`, or `./<filename>` when the platform
/// has no config directory
pub fn default_config_path(filename: &str) -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("rill"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        value: i32,
        name: String,
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: TestConfig = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_load_malformed_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "value: [not, an, int").unwrap();

        let config: TestConfig = load_config(&path);
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_roundtrip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test-config.yaml");
        let config = TestConfig {
            value: 42,
            name: "test".to_string(),
        };

        save_config(&config, &path).unwrap();
        let loaded: TestConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("playback.yaml");
        assert!(path.ends_with("playback.yaml"));
    }
}
