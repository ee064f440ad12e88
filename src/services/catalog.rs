//! Catalog service - the entry point callers use to trigger scans.
//!
//! Owns the shared connection, the courses root and the media probe. Every
//! scan holds the connection lock for its whole duration, so scans issued
//! through one service never overlap.

use std::path::{Path, PathBuf};

use crate::db::{self, try_lock, DbPool};
use crate::domain::Course;
use crate::error::{CatalogError, Result};
use crate::library::{self, sort_natural_by_key, CourseScan, LessonScanReport};
use crate::media::MediaProbe;

#[derive(Debug)]
pub struct CatalogService<P> {
    pool: DbPool,
    courses_root: PathBuf,
    probe: P,
}

impl<P: MediaProbe> CatalogService<P> {
    pub fn new(pool: DbPool, courses_root: impl Into<PathBuf>, probe: P) -> Self {
        Self {
            pool,
            courses_root: courses_root.into(),
            probe,
        }
    }

    pub fn courses_root(&self) -> &Path {
        &self.courses_root
    }

    /// Discover and register courses not yet in the catalog.
    pub fn scan(&self) -> Result<CourseScan> {
        let mut conn = try_lock(&self.pool)?;
        library::scan_and_register_new_courses(&mut conn, &self.courses_root, &self.probe)
    }

    /// Re-walk one known course, refreshing locations and adding new files.
    pub fn rescan_course(&self, course_id: i64) -> Result<LessonScanReport> {
        let mut conn = try_lock(&self.pool)?;
        let course = db::get_course(&conn, course_id)?
            .ok_or(CatalogError::CourseNotFound(course_id))?;
        library::register_lessons_for_course(
            &mut conn,
            Path::new(&course.path),
            course.id,
            &self.probe,
        )
    }

    /// Re-walk every known course in natural order of path.
    ///
    /// Stops at the first failing course; courses already committed stay
    /// committed.
    pub fn rescan_all(&self) -> Result<Vec<LessonScanReport>> {
        let mut conn = try_lock(&self.pool)?;
        let mut courses = db::list_courses(&conn)?;
        sort_natural_by_key(&mut courses, |c| c.path.as_str());

        let mut reports = Vec::with_capacity(courses.len());
        for course in &courses {
            reports.push(library::register_lessons_for_course(
                &mut conn,
                Path::new(&course.path),
                course.id,
                &self.probe,
            )?);
        }
        Ok(reports)
    }

    pub fn courses(&self) -> Result<Vec<Course>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_courses(&conn)?)
    }
}
