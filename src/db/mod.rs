pub mod courses;
pub mod lessons;
pub mod schema;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use courses::{find_all_course_paths, get_course, insert_courses, list_courses};
pub use lessons::{apply_upserts, count_lessons, find_lessons, list_lessons, UpsertCounts};
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// How long a write waits on a lock held by the viewing application.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

/// Open (or create) the catalog database and bring its schema up to date.
pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    if let Err(e) = std::fs::copy(path, &backup_path) {
      tracing::warn!("Could not create database backup: {}", e);
    }
  }

  let conn = Connection::open(path)?;
  let mode: String =
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
  tracing::debug!("Journal mode: {}", mode);
  conn.busy_timeout(BUSY_TIMEOUT)?;

  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_init_db_creates_parent_and_backup() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/catalog.db");

    let pool = init_db(&path).unwrap();
    assert!(path.exists());
    drop(pool);

    // Second open backs up the existing file first
    let _pool = init_db(&path).unwrap();
    assert!(path.with_extension("db.backup").exists());
  }

  #[test]
  fn test_init_db_enables_wal() {
    let temp = TempDir::new().unwrap();
    let pool = init_db(&temp.path().join("catalog.db")).unwrap();
    let conn = try_lock(&pool).unwrap();

    let mode: String = conn
      .pragma_query_value(None, "journal_mode", |row| row.get(0))
      .unwrap();
    assert_eq!(mode, "wal");
  }

  #[test]
  fn test_log_warn_default_swallows_error() {
    let failed: std::result::Result<f64, String> = Err("probe failed".into());
    assert_eq!(failed.log_warn_default("duration"), 0.0);

    let ok: std::result::Result<f64, String> = Ok(4.5);
    assert_eq!(ok.log_warn("duration"), Some(4.5));
  }

  #[test]
  fn test_try_lock() {
    let pool: DbPool = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
    assert!(try_lock(&pool).is_ok());
  }
}
