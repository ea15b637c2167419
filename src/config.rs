//! Configuration file parser for ~/.config/curio/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted, but we log a warning since they are usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{CategoryTab, SortMode, ViewState};
use crate::storage::DEFAULT_UPLOAD_CHUNK_BYTES;

/// Default photo size limit (10 MiB).
pub const DEFAULT_MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog database file. `None` means `catalog.db` in the config directory.
    pub database_path: Option<String>,

    /// Sort mode the `list` command starts from.
    pub default_sort: SortMode,

    /// Category tab the `list` command starts from.
    pub default_category: CategoryTab,

    /// Photo upload chunk size in bytes (values below 1 are treated as 1).
    pub upload_chunk_bytes: usize,

    /// Largest photo accepted by add-item validation.
    pub max_photo_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            default_sort: SortMode::Newest,
            default_category: CategoryTab::All,
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "database_path",
        "default_sort",
        "default_category",
        "upload_chunk_bytes",
        "max_photo_bytes",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML or a bad value → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check size before reading so a corrupted file can't exhaust memory
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        config.upload_chunk_bytes = config.upload_chunk_bytes.max(1);
        tracing::info!(
            path = %path.display(),
            sort = %config.default_sort,
            category = %config.default_category,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Database file to open, relative paths resolved against `config_dir`.
    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        match &self.database_path {
            Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => config_dir.join(p),
            None => config_dir.join("catalog.db"),
        }
    }

    /// View state the list command starts from.
    pub fn initial_view(&self) -> ViewState {
        let mut view = ViewState::new();
        view.set_selected_category(self.default_category);
        view.set_sort_mode(self.default_sort);
        view
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("curio_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_path.is_none());
        assert_eq!(config.default_sort, SortMode::Newest);
        assert_eq!(config.default_category, CategoryTab::All);
        assert_eq!(config.upload_chunk_bytes, 65_536);
        assert_eq!(config.max_photo_bytes, 10_485_760);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/curio_test_nonexistent_config.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
database_path = "/var/lib/curio/catalog.db"
default_sort = "year-desc"
default_category = "books"
upload_chunk_bytes = 1024
max_photo_bytes = 2048
"#;
        let (dir, path) = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.database_path.as_deref(),
            Some("/var/lib/curio/catalog.db")
        );
        assert_eq!(config.default_sort, SortMode::YearDesc);
        assert_eq!(config.default_category, CategoryTab::Books);
        assert_eq!(config.upload_chunk_bytes, 1024);
        assert_eq!(config.max_photo_bytes, 2048);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "default_sort = \"oldest\"\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_sort, SortMode::Oldest);
        assert_eq!(config.default_category, CategoryTab::All);
        assert_eq!(config.max_photo_bytes, DEFAULT_MAX_PHOTO_BYTES);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        let (dir, path) = write_config("zero_chunk", "upload_chunk_bytes = 0\n");
        assert_eq!(Config::load(&path).unwrap().upload_chunk_bytes, 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_sort_mode_rejected() {
        let (dir, path) = write_config("bad_sort", "default_sort = \"alphabetical\"\n");
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Parse(_)
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
default_category = "tins"
totally_fake_key = "should not fail"
"#;
        let (dir, path) = write_config("unknown", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_category, CategoryTab::Tins);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_database_path_resolution() {
        let dir = Path::new("/home/u/.config/curio");
        let mut config = Config::default();
        assert_eq!(config.database_path(dir), dir.join("catalog.db"));

        config.database_path = Some("other.db".into());
        assert_eq!(config.database_path(dir), dir.join("other.db"));

        config.database_path = Some("/data/c.db".into());
        assert_eq!(config.database_path(dir), PathBuf::from("/data/c.db"));
    }

    #[test]
    fn test_initial_view_uses_defaults() {
        let config = Config {
            default_sort: SortMode::YearAsc,
            default_category: CategoryTab::Books,
            ..Config::default()
        };
        let view = config.initial_view();
        assert_eq!(view.sort_mode(), SortMode::YearAsc);
        assert_eq!(view.selected_category(), CategoryTab::Books);
        assert_eq!(view.search_query(), "");
    }
}
