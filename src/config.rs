//! Catalog configuration.
//!
//! Each value is resolved with priority: `config.toml` > environment
//! (including `.env`) > default.
//!
//! ```toml
//! [database]
//! path = "data/catalog.db"
//!
//! [library]
//! root = "/data"
//! ```

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{CatalogError, Result};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default SQLite catalog location
pub const DEFAULT_DATABASE_PATH: &str = "data/catalog.db";

/// Default directory holding one subdirectory per course
pub const DEFAULT_COURSES_ROOT: &str = "/data";

/// Environment override for the database path
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Environment override for the courses root
pub const COURSES_DIR_ENV: &str = "COURSES_DIR";

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database: Option<DatabaseConfig>,
    library: Option<LibraryConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LibraryConfig {
    root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub database_path: PathBuf,
    pub courses_root: PathBuf,
}

impl CatalogConfig {
    /// Load from `config.toml`, `.env` and the process environment.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let contents = std::fs::read_to_string(CONFIG_FILE).ok();
        Self::resolve(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Resolve from optional config file contents and an environment lookup.
    pub fn resolve<F>(config_toml: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: ConfigFile = match config_toml {
            Some(contents) => toml::from_str(contents).map_err(|e| CatalogError::Config {
                message: format!("{}: {}", CONFIG_FILE, e),
            })?,
            None => ConfigFile::default(),
        };

        let database_path = pick(
            "database path",
            file.database.and_then(|d| d.path),
            env(DATABASE_PATH_ENV),
            DEFAULT_DATABASE_PATH,
        );
        let courses_root = pick(
            "courses root",
            file.library.and_then(|l| l.root),
            env(COURSES_DIR_ENV),
            DEFAULT_COURSES_ROOT,
        );

        Ok(Self {
            database_path,
            courses_root,
        })
    }
}

fn pick(what: &str, from_file: Option<String>, from_env: Option<String>, default: &str) -> PathBuf {
    if let Some(value) = from_file {
        tracing::info!("Using {} from {}: {}", what, CONFIG_FILE, value);
        return PathBuf::from(value);
    }
    if let Some(value) = from_env {
        tracing::info!("Using {} from environment: {}", what, value);
        return PathBuf::from(value);
    }
    tracing::info!("Using default {}: {}", what, default);
    PathBuf::from(default)
}
