// src/config.rs
//
// Application configuration
//
// Resolution order:
// 1. Explicit path (command-line argument)
// 2. VEHICLESALE_CONFIG environment variable
// 3. {config_dir}/vehiclesale/config.toml, if present
// 4. Compiled defaults
//
// Every section and field is optional in the file; missing values fall back
// to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::ImportKind;
use crate::error::{AppError, AppResult};

pub const CONFIG_ENV_VAR: &str = "VEHICLESALE_CONFIG";

/// Upload size limit for a single bulk-import file (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    pub storage: StorageConfig,
    pub import: ImportConfig,
}

/// Where uploaded files go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Plain directory tree, served under `public_base_url`
    Local {
        root: PathBuf,
        public_base_url: String,
    },

    /// Hosted object storage speaking the `/storage/v1/object` REST dialect
    Http { base_url: String, api_key: String },
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join("vehiclesale").join("storage"))
            .unwrap_or_else(|| PathBuf::from("./vehiclesale_storage"));

        StorageConfig::Local {
            root,
            public_base_url: "http://localhost:8080/storage".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub max_file_size_bytes: u64,
    pub photo_extensions: Vec<String>,
    pub report_extensions: Vec<String>,
    pub photo_bucket: String,
    pub report_bucket: String,

    /// Delay before a fully matched batch may auto-close its progress view
    pub auto_close_delay_ms: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            photo_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            report_extensions: vec!["pdf".to_string()],
            photo_bucket: "vehicle-photos".to_string(),
            report_bucket: "vehicle-reports".to_string(),
            auto_close_delay_ms: 1500,
        }
    }
}

impl ImportConfig {
    pub fn allowed_extensions(&self, kind: ImportKind) -> &[String] {
        match kind {
            ImportKind::Photo => &self.photo_extensions,
            ImportKind::Report => &self.report_extensions,
        }
    }

    pub fn bucket(&self, kind: ImportKind) -> &str {
        match kind {
            ImportKind::Photo => &self.photo_bucket,
            ImportKind::Report => &self.report_bucket,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load following the resolution order documented at the top of this file
    pub fn load(explicit_path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = explicit_path {
            log::info!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            log::info!("Loading configuration from ${} = {}", CONFIG_ENV_VAR, path);
            return Self::from_file(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Database path, falling back to the platform data directory
    pub fn resolved_database_path(&self) -> AppResult<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::get_database_path(),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.import.max_file_size_bytes == 0 {
            return Err(AppError::Config(
                "import.max_file_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.import.photo_bucket.trim().is_empty() || self.import.report_bucket.trim().is_empty() {
            return Err(AppError::Config("import bucket names cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// {config_dir}/vehiclesale/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vehiclesale").join("config.toml"))
}
