//! Tool settings.
//!
//! Settings say where the library lives and where the master file is. They
//! can be overridden by an optional TOML file:
//!
//! ```toml
//! base_dir = "D:/Games"
//! master_config = "master.txt"
//! quarantine_unmatched = true
//! idle_wait_secs = 5
//! ```
//!
//! Relative paths in the file are resolved against the base directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the master file looked up in the base directory.
pub const MASTER_FILE_NAME: &str = "master.txt";

/// Settings file looked up in the base directory when none is given.
pub const LOCAL_SETTINGS_FILE: &str = ".romshelf.toml";

const DEFAULT_IDLE_WAIT_SECS: u64 = 5;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("IO error reading settings: {0}")]
    Io(String),
}

/// On-disk form of [`Settings`]; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub base_dir: Option<PathBuf>,
    pub master_config: Option<PathBuf>,
    pub quarantine_unmatched: Option<bool>,
    pub idle_wait_secs: Option<u64>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the working folders.
    pub base_dir: PathBuf,
    /// Path of the master destination file.
    pub master_config: PathBuf,
    /// Whether unmatched ROMs are quarantined. `None` means ask.
    pub quarantine_unmatched: Option<bool>,
    /// How long "press Enter" pauses wait before continuing.
    pub idle_wait: Duration,
}

impl Settings {
    /// Default settings rooted at `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            master_config: base_dir.join(MASTER_FILE_NAME),
            quarantine_unmatched: None,
            idle_wait: Duration::from_secs(DEFAULT_IDLE_WAIT_SECS),
        }
    }

    /// Loads settings for `base_dir`.
    ///
    /// Uses `settings_path` if given, otherwise `.romshelf.toml` in
    /// `base_dir` if present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if the
    /// chosen file cannot be read or parsed.
    pub fn load(base_dir: &Path, settings_path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match settings_path {
            Some(path) => Self::read_file(path)?,
            None => {
                let local = base_dir.join(LOCAL_SETTINGS_FILE);
                if local.exists() {
                    Self::read_file(&local)?
                } else {
                    SettingsFile::default()
                }
            }
        };
        Ok(Self::with_base_dir(base_dir).apply(file))
    }

    fn read_file(path: &Path) -> Result<SettingsFile, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| SettingsError::Invalid(e.to_string()))
    }

    /// Overlays the values present in `file`.
    pub fn apply(mut self, file: SettingsFile) -> Self {
        if let Some(base_dir) = file.base_dir {
            let base_dir = self.base_dir.join(base_dir);
            self = self.with_base_dir_override(&base_dir);
        }
        if let Some(master) = file.master_config {
            self.master_config = self.base_dir.join(master);
        }
        if file.quarantine_unmatched.is_some() {
            self.quarantine_unmatched = file.quarantine_unmatched;
        }
        if let Some(secs) = file.idle_wait_secs {
            self.idle_wait = Duration::from_secs(secs);
        }
        self
    }

    /// Replaces the base directory. A master file that still sits at its
    /// default location follows the new base directory.
    pub fn with_base_dir_override(mut self, base_dir: &Path) -> Self {
        if self.master_config == self.base_dir.join(MASTER_FILE_NAME) {
            self.master_config = base_dir.join(MASTER_FILE_NAME);
        }
        self.base_dir = base_dir.to_path_buf();
        self
    }

    /// Points the master file at `path`, relative to the base directory.
    pub fn with_master_config(mut self, path: &Path) -> Self {
        self.master_config = self.base_dir.join(path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_base_dir(Path::new("/games"));
        assert_eq!(settings.master_config, PathBuf::from("/games/master.txt"));
        assert_eq!(settings.quarantine_unmatched, None);
        assert_eq!(settings.idle_wait, Duration::from_secs(5));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::load(temp_dir.path(), None).expect("Failed to load settings");
        assert_eq!(settings, Settings::with_base_dir(temp_dir.path()));
    }

    #[test]
    fn test_local_file_overrides() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            temp_dir.path().join(LOCAL_SETTINGS_FILE),
            "master_config = \"conf/targets.txt\"\nquarantine_unmatched = true\nidle_wait_secs = 0\n",
        )
        .expect("Failed to write settings");

        let settings = Settings::load(temp_dir.path(), None).expect("Failed to load settings");
        assert_eq!(settings.master_config, temp_dir.path().join("conf/targets.txt"));
        assert_eq!(settings.quarantine_unmatched, Some(true));
        assert_eq!(settings.idle_wait, Duration::ZERO);
    }

    #[test]
    fn test_base_dir_moves_default_master() {
        let settings = Settings::with_base_dir(Path::new("/games")).apply(SettingsFile {
            base_dir: Some(PathBuf::from("library")),
            ..Default::default()
        });
        assert_eq!(settings.base_dir, PathBuf::from("/games/library"));
        assert_eq!(settings.master_config, PathBuf::from("/games/library/master.txt"));
    }

    #[test]
    fn test_base_dir_override_wins_over_file() {
        let flag_dir = TempDir::new().expect("Failed to create temp directory");
        let elsewhere = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            flag_dir.path().join(LOCAL_SETTINGS_FILE),
            format!("base_dir = {:?}\n", elsewhere.path().display().to_string()),
        )
        .expect("Failed to write settings");

        let loaded = Settings::load(flag_dir.path(), None).expect("Failed to load settings");
        assert_eq!(loaded.base_dir, elsewhere.path());

        let settings = loaded.with_base_dir_override(flag_dir.path());
        assert_eq!(settings.base_dir, flag_dir.path());
        assert_eq!(settings.master_config, flag_dir.path().join(MASTER_FILE_NAME));
    }

    #[test]
    fn test_base_dir_override_keeps_explicit_master() {
        let settings = Settings::with_base_dir(Path::new("/games"))
            .apply(SettingsFile {
                master_config: Some(PathBuf::from("/etc/romshelf/master.txt")),
                ..Default::default()
            })
            .with_base_dir_override(Path::new("/library"));
        assert_eq!(settings.base_dir, PathBuf::from("/library"));
        assert_eq!(settings.master_config, PathBuf::from("/etc/romshelf/master.txt"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope.toml");
        let result = Settings::load(temp_dir.path(), Some(&missing));
        assert!(matches!(result, Err(SettingsError::NotFound(_))));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "unknown_key = 1\n").expect("Failed to write settings");
        let result = Settings::load(temp_dir.path(), Some(&path));
        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }
}
