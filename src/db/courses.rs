//! Course records

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{CoverImage, Course, NewCourse};

/// Paths of every known course, the identity set used for discovery.
pub fn find_all_course_paths(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT path FROM courses")?;
    let paths = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<HashSet<String>>>()?;
    Ok(paths)
}

/// Insert a batch of new courses with no cover image set.
///
/// Returns the stored courses with their assigned ids, in input order.
/// Callers run this inside a transaction so the batch lands as a unit.
pub fn insert_courses(conn: &Connection, courses: &[NewCourse]) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO courses (name, path, is_cover_url, file_cover, url_cover, created_at)
        VALUES (?1, ?2, 0, NULL, NULL, ?3)
        "#,
    )?;

    let mut stored = Vec::with_capacity(courses.len());
    for course in courses {
        let created_at = Utc::now();
        stmt.execute(params![course.name, course.path, created_at.to_rfc3339()])?;
        stored.push(Course {
            id: conn.last_insert_rowid(),
            name: course.name.clone(),
            path: course.path.clone(),
            cover: None,
            created_at: Some(created_at),
        });
    }
    Ok(stored)
}

pub fn get_course(conn: &Connection, id: i64) -> Result<Option<Course>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, path, is_cover_url, file_cover, url_cover, created_at
        FROM courses WHERE id = ?1
        "#,
    )?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_course(row)?))
    } else {
        Ok(None)
    }
}

pub fn list_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, name, path, is_cover_url, file_cover, url_cover, created_at
        FROM courses
        ORDER BY id ASC
        "#,
    )?;

    let courses = stmt
        .query_map([], |row| row_to_course(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(courses)
}

fn row_to_course(row: &rusqlite::Row) -> Result<Course> {
    let is_cover_url: i64 = row.get(3)?;
    let created_at: Option<String> = row.get(6)?;

    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        cover: CoverImage::from_columns(is_cover_url != 0, row.get(4)?, row.get(5)?),
        created_at: created_at.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
    })
}
