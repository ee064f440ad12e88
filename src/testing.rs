//! Test utilities for database and course tree setup.
//!
//! Reuses the authoritative schema initialization so tests never carry their
//! own copy of the tables.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::media::{MediaProbe, ProbeError};

/// Test environment with a migrated catalog database and a scratch directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// catalog.db connection with full schema (all migrations)
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("catalog.db"))?;
        crate::db::schema::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Root directory under which test courses live.
    pub fn courses_root(&self) -> PathBuf {
        let root = self.temp.path().join("courses");
        fs::create_dir_all(&root).unwrap();
        root
    }
}

/// Create an empty file (and its parent directories) under `root`.
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"").unwrap();
    path
}

/// Probe returning the same duration for every file and counting calls.
#[derive(Debug, Default)]
pub struct FixedProbe {
    pub seconds: f64,
    pub calls: std::cell::RefCell<Vec<PathBuf>>,
}

impl FixedProbe {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            calls: Default::default(),
        }
    }

    pub fn probed(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }
}

impl MediaProbe for FixedProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError> {
        self.calls.borrow_mut().push(path.to_path_buf());
        Ok(self.seconds)
    }
}

/// Probe that always fails.
#[derive(Debug, Default)]
pub struct FailingProbe;

impl MediaProbe for FailingProbe {
    fn duration_seconds(&self, path: &Path) -> Result<f64, ProbeError> {
        Err(ProbeError::Unreadable {
            path: path.to_path_buf(),
            message: "no streams".to_string(),
        })
    }
}
