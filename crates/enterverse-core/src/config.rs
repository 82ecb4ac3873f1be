use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::EnterverseError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tmdb: TmdbConfig,
    pub books: BooksConfig,
    pub rawg: RawgConfig,
    pub profile: ProfileConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// `tracing` env-filter directive.
    pub log_level: String,
    pub default_book_query: String,
    pub home_book_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub base_url: String,
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the favorites collection is stored under.
    pub favorites_key: String,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, EnterverseError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults when it is missing.
    pub fn load_from(path: &Path) -> Result<Self, EnterverseError> {
        if !path.exists() {
            return Self::from_toml_str("");
        }
        let user_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&user_str)
    }

    /// Parse user TOML, taking every key it does not set from the defaults.
    pub fn from_toml_str(user: &str) -> Result<Self, EnterverseError> {
        let mut merged: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| EnterverseError::Config(e.to_string()))?;
        let user: toml::Value =
            toml::from_str(user).map_err(|e| EnterverseError::Config(e.to_string()))?;
        merge_toml(&mut merged, user);
        merged
            .try_into()
            .map_err(|e: toml::de::Error| EnterverseError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), EnterverseError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), EnterverseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EnterverseError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory for application data (database, logs).
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path to the database file.
    pub fn db_path() -> PathBuf {
        Self::data_dir().join("enterverse.db")
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, EnterverseError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "enterverse")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge, everything else replaces.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.general.default_book_query, "bestsellers");
        assert_eq!(config.general.home_book_query, "api");
        assert_eq!(config.profile.user_id, 2);
        assert_eq!(config.storage.favorites_key, "favorites");
        assert!(config.profile.api_key.is_none());
    }

    #[test]
    fn test_partial_user_file_merges_over_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [tmdb]
            api_key = "secret"

            [storage]
            favorites_key = "favs_v2"
            "#,
        )
        .unwrap();
        assert_eq!(config.tmdb.api_key, "secret");
        assert_eq!(config.tmdb.language, "en-US");
        assert_eq!(config.storage.favorites_key, "favs_v2");
        assert_eq!(config.rawg.base_url, "https://api.rawg.io/api");
    }

    #[test]
    fn test_invalid_user_file_is_config_error() {
        let err = AppConfig::from_toml_str("[tmdb]\napi_key = 5").unwrap_err();
        assert!(matches!(err, EnterverseError::Config(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.rawg.api_key = "rawg-key".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.rawg.api_key, "rawg-key");
        assert_eq!(loaded.general.log_level, config.general.log_level);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.books.base_url, "https://www.googleapis.com/books/v1");
    }
}
