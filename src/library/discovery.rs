//! Course discovery - scanning the library root for course directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::registration::{register_lessons_for_course, LessonScanReport};
use super::walker::{ensure_dir, sorted_walk, walk_error};
use crate::db;
use crate::domain::{Course, NewCourse};
use crate::error::Result;
use crate::media::MediaProbe;

/// Outcome of a library scan.
#[derive(Debug, Clone, Default)]
pub struct CourseScan {
    /// Courses created by this scan, in discovery order
    pub registered: Vec<Course>,
    /// Lesson registration of each new course
    pub lessons: Vec<LessonScanReport>,
}

/// Course directory on disk that the catalog does not know yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDir {
    /// Directory as found under the root; lessons are walked from here
    pub dir: PathBuf,
    pub course: NewCourse,
}

/// Immediate subdirectories of `root` whose full path is not in `known`.
///
/// Returned in natural order of directory name. Directories whose path is
/// not valid UTF-8 are skipped with a warning.
pub fn find_new_course_dirs(root: &Path, known: &HashSet<String>) -> Result<Vec<CourseDir>> {
    ensure_dir(root)?;

    let mut found = Vec::new();
    for entry in sorted_walk(root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => match walk_error(err) {
                Some(e) => return Err(e),
                None => continue,
            },
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let (Some(name), Some(path)) = (entry.file_name().to_str(), entry.path().to_str()) else {
            tracing::warn!(
                "Skipping course directory {}: path is not valid UTF-8",
                entry.path().display()
            );
            continue;
        };
        if known.contains(path) {
            continue;
        }

        let course = NewCourse {
            name: name.to_string(),
            path: path.to_string(),
        };
        found.push(CourseDir {
            dir: entry.into_path(),
            course,
        });
    }
    Ok(found)
}

/// Register every course directory under `root` not yet in the catalog.
///
/// New courses are inserted and committed as one batch before any lesson
/// registration, so each walk runs against a durable course id. When nothing
/// new is found the store is not written to at all.
pub fn scan_and_register_new_courses(
    conn: &mut Connection,
    root: &Path,
    probe: &dyn MediaProbe,
) -> Result<CourseScan> {
    let known = db::find_all_course_paths(conn)?;
    let new_dirs = find_new_course_dirs(root, &known)?;

    if new_dirs.is_empty() {
        tracing::info!("No new courses under {}", root.display());
        return Ok(CourseScan::default());
    }

    let new_courses: Vec<NewCourse> = new_dirs.iter().map(|d| d.course.clone()).collect();
    let tx = conn.transaction()?;
    let registered = db::insert_courses(&tx, &new_courses)?;
    tx.commit()?;

    let mut lessons = Vec::with_capacity(registered.len());
    for (course, found) in registered.iter().zip(&new_dirs) {
        tracing::info!("Registered course {} ({})", course.name, course.path);
        lessons.push(register_lessons_for_course(conn, &found.dir, course.id, probe)?);
    }

    tracing::info!("New courses registered: {}", registered.len());
    Ok(CourseScan {
        registered,
        lessons,
    })
}
