//! Storage configuration and path management for the dashboard client.
//!
//! Every file the client owns lives under one root so tests can point the
//! whole client at a temp directory:
//!
//! - `config.json`: connection and polling settings
//! - `preferences.json`: operator preferences (language, collapsed sections, history)
//! - `logs/`: rolling console logs

use std::path::{Path, PathBuf};

use crate::error::{Result, ShogunError};

const ROOT_DIR_NAME: &str = ".shogun-gui";

/// Central configuration for all client storage paths.
///
/// Production code uses `StorageConfig::from_home()` which points to `~/.shogun-gui/`.
/// Tests use `StorageConfig::with_root(temp_dir)` for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves `~/.shogun-gui`.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ShogunError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(ROOT_DIR_NAME),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (connection and polling settings).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to preferences.json (operator preference key-value store).
    pub fn preferences_file(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Path to logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.logs_dir()] {
            fs_err::create_dir_all(&dir).map_err(|source| ShogunError::Io {
                context: format!("creating {}", dir.display()),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_with_root_sets_custom_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/test-shogun"));
        assert_eq!(config.root(), Path::new("/tmp/test-shogun"));
    }

    #[test]
    fn test_file_paths_live_under_root() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/shogun"));
        assert_eq!(config.config_file(), PathBuf::from("/tmp/shogun/config.json"));
        assert_eq!(
            config.preferences_file(),
            PathBuf::from("/tmp/shogun/preferences.json")
        );
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/shogun/logs"));
    }

    #[test]
    fn test_ensure_dirs_creates_structure() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::with_root(temp.path().join("nested"));

        config.ensure_dirs().unwrap();

        assert!(config.root().exists());
        assert!(config.logs_dir().exists());
    }
}
