//! Error types for catalog scans.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a scan.
///
/// Unsupported files are never errors; they are filtered out before any
/// of these can occur.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A followed symlink points back at one of its own ancestors.
    #[error("Symlink loop at {path} (back to {ancestor})")]
    SymlinkLoop { path: PathBuf, ancestor: PathBuf },

    /// Scan root or course root is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Record store failure.
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// The shared connection lock is poisoned.
    #[error("Database unavailable")]
    DbUnavailable,

    #[error("Course {0} not found")]
    CourseNotFound(i64),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl CatalogError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

impl From<crate::db::DbLockError> for CatalogError {
    fn from(_: crate::db::DbLockError) -> Self {
        Self::DbUnavailable
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
