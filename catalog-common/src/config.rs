//! Configuration loading and root folder resolution
//!
//! Root folder resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CATALOG_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops a service from starting:
//! it is logged as a warning and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CATALOG_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "catalog.db";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[dedup]` section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Address the review API binds to
    pub bind_addr: String,
    /// Upper bound on any single catalog store call
    pub store_timeout_ms: u64,
    /// Delegate encoding to the database when it offers a phonetic function
    /// and that function passes the parity check
    pub prefer_native_encoding: bool,
    /// Group records whose names produce the empty code (no ASCII letters)
    pub include_empty_code: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5730".to_string(),
            store_timeout_ms: 5000,
            prefer_native_encoding: false,
            include_empty_code: true,
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub dedup: DedupConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a TOML config file, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Using default configuration ({})", e);
                Self::default()
            }
        }
    }
}

/// Default location of `config.toml` for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("catalog").join("config.toml"))
}

/// OS-dependent defaults compiled into the binary
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/catalog (or /var/lib/catalog for system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("catalog"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/catalog"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("catalog"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/catalog"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("catalog"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\catalog"))
        } else {
            PathBuf::from("./catalog_data")
        };

        Self { root_folder }
    }
}

/// Resolves the root folder holding the catalog database
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
            config_path: default_config_path(),
        }
    }

    /// Command-line override (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Use a specific config file instead of the platform default
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.config_path = path;
        }
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!("[{}] root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                debug!("[{}] root folder from {}", self.module_name, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(config_path) = self.config_path.as_deref().filter(|p| p.exists()) {
            if let Some(root) = TomlConfig::load_or_default(config_path).root_folder {
                debug!("[{}] root folder from {}", self.module_name, config_path.display());
                return root;
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the root folder for use
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}
