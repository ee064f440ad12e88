//! Lesson records and batched upserts

use std::collections::HashMap;

use rusqlite::{params, Connection, Result};

use crate::domain::{HierarchyPath, Lesson, LessonProgress, LessonSource, LessonUpsert};

/// Outcome of one `apply_upserts` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
}

/// Existing lessons of a course keyed by hierarchy path.
pub fn find_lessons(conn: &Connection, course_id: i64) -> Result<HashMap<HierarchyPath, Lesson>> {
    let lessons = list_lessons(conn, course_id)?;
    Ok(lessons
        .into_iter()
        .map(|l| (l.hierarchy_path.clone(), l))
        .collect())
}

pub fn list_lessons(conn: &Connection, course_id: i64) -> Result<Vec<Lesson>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, course_id, title, module, hierarchy_path, video_url, pdf_url, duration,
               progress_status, is_completed, time_elapsed
        FROM lessons
        WHERE course_id = ?1
        ORDER BY id ASC
        "#,
    )?;

    let lessons = stmt
        .query_map(params![course_id], |row| row_to_lesson(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(lessons)
}

pub fn count_lessons(conn: &Connection, course_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM lessons WHERE course_id = ?1",
        params![course_id],
        |row| row.get(0),
    )
}

/// Persist a walk's upserts.
///
/// Updates only rewrite `video_url`, `pdf_url` and `duration`; progress
/// columns of existing lessons are never part of the statement. Callers wrap
/// this in a transaction so the whole batch commits or none of it does.
pub fn apply_upserts(conn: &Connection, upserts: &[LessonUpsert]) -> Result<UpsertCounts> {
    let mut update = conn.prepare_cached(
        "UPDATE lessons SET video_url = ?1, pdf_url = ?2, duration = ?3 WHERE id = ?4",
    )?;
    let mut insert = conn.prepare_cached(
        r#"
        INSERT INTO lessons (course_id, title, module, hierarchy_path, video_url, pdf_url, duration,
                             progress_status, is_completed, time_elapsed)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )?;

    let mut counts = UpsertCounts::default();
    for upsert in upserts {
        match upsert {
            LessonUpsert::Update(lesson) => {
                update.execute(params![
                    lesson.source.video_url(),
                    lesson.source.pdf_url(),
                    lesson.duration,
                    lesson.id,
                ])?;
                counts.updated += 1;
            }
            LessonUpsert::Insert(lesson) => {
                insert.execute(params![
                    lesson.course_id,
                    lesson.title,
                    lesson.module,
                    lesson.hierarchy_path,
                    lesson.source.video_url(),
                    lesson.source.pdf_url(),
                    lesson.duration,
                    lesson.progress.status,
                    lesson.progress.is_completed,
                    lesson.progress.time_elapsed,
                ])?;
                counts.inserted += 1;
            }
        }
    }
    Ok(counts)
}

fn row_to_lesson(row: &rusqlite::Row) -> Result<Lesson> {
    let is_completed: i64 = row.get(9)?;

    Ok(Lesson {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        module: row.get(3)?,
        hierarchy_path: row.get(4)?,
        source: LessonSource::from_columns(row.get(5)?, row.get(6)?),
        duration: row.get(7)?,
        progress: LessonProgress {
            status: row.get(8)?,
            is_completed: is_completed != 0,
            time_elapsed: row.get(10)?,
        },
    })
}
