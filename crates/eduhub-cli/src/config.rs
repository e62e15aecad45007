//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. Environment variables prefixed `EDUHUB__` (`EDUHUB__STORE__DATABASE`)
//! 2. Config file (`--config FILE`, else the platform config directory)
//! 3. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "EDUHUB";

const DEFAULT_DATABASE: &str = "eduhub_db";
const DEFAULT_COURSES_COLLECTION: &str = "courses";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where documents are persisted.
    pub store: StoreConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database name; the snapshot file is `<data_dir>/<database>.json`.
    pub database: String,
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Collection that `course add` and `course list` work on.
    pub courses_collection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                database: DEFAULT_DATABASE.into(),
                data_dir: None,
                courses_collection: DEFAULT_COURSES_COLLECTION.into(),
            },
            output: OutputConfig {
                no_color: false,
                format: "auto".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and the environment.
    ///
    /// `config_file` is the path passed via `--config`. An explicit file must
    /// exist when `require_file` is set; the default location is always
    /// optional.
    pub fn load(config_file: Option<&Path>, require_file: bool) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let path = Self::resolve_path(config_file);
        let required = config_file.is_some() && require_file;

        let settings = Config::builder()
            .set_default("store.database", defaults.store.database)?
            .set_default("store.courses_collection", defaults.store.courses_collection)?
            .set_default("output.no_color", defaults.output.no_color)?
            .set_default("output.format", defaults.output.format)?
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("configuration values have the wrong shape")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.eduhub.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "eduhub", "eduhub")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".eduhub.toml"))
    }

    /// The file that is (or would be) read: the explicit one if given.
    pub fn resolve_path(config_file: Option<&Path>) -> PathBuf {
        config_file
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path)
    }

    /// Directory holding database snapshots.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.store.data_dir {
            return dir.clone();
        }
        ProjectDirs::from("com", "eduhub", "eduhub")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".eduhub"))
    }

    /// Snapshot file of the configured database.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(format!("{}.json", self.store.database))
    }
}
