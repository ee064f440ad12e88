use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS courses (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      path TEXT NOT NULL UNIQUE,
      is_cover_url INTEGER NOT NULL DEFAULT 0,
      file_cover TEXT,
      url_cover TEXT,
      created_at TEXT
    );

    CREATE TABLE IF NOT EXISTS lessons (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      course_id INTEGER NOT NULL,
      title TEXT NOT NULL,
      module TEXT NOT NULL,
      hierarchy_path TEXT NOT NULL,
      video_url TEXT NOT NULL DEFAULT '',
      pdf_url TEXT NOT NULL DEFAULT '',
      duration TEXT NOT NULL DEFAULT '0',
      -- Progress columns, owned by the viewing application
      progress_status TEXT NOT NULL DEFAULT 'not_started',
      is_completed INTEGER NOT NULL DEFAULT 0,
      time_elapsed TEXT NOT NULL DEFAULT '0',
      FOREIGN KEY (course_id) REFERENCES courses(id),
      UNIQUE (course_id, hierarchy_path)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_lessons_course_id ON lessons(course_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: cover columns (catalogs created before cover support)
  add_column_if_missing(conn, "courses", "is_cover_url", "INTEGER NOT NULL DEFAULT 0")?;
  add_column_if_missing(conn, "courses", "file_cover", "TEXT")?;
  add_column_if_missing(conn, "courses", "url_cover", "TEXT")?;
  add_column_if_missing(conn, "courses", "created_at", "TEXT")?;

  // Migration: elapsed time tracking
  add_column_if_missing(conn, "lessons", "time_elapsed", "TEXT NOT NULL DEFAULT '0'")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(
  conn: &Connection,
  table: &str,
  column: &str,
  column_def: &str,
) -> Result<()> {
  if !column_exists(conn, table, column) {
    tracing::info!("Adding column {}.{}", table, column);
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
