//! Lesson registration for one course, committed as a single transaction.

use std::path::Path;

use rusqlite::Connection;

use super::walker::walk_course;
use crate::db;
use crate::domain::HierarchyPath;
use crate::error::Result;
use crate::media::MediaProbe;

/// Summary of one course's lesson registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonScanReport {
    pub course_id: i64,
    pub inserted: usize,
    pub updated: usize,
    /// Stored lessons whose file has disappeared; left untouched
    pub orphaned: Vec<HierarchyPath>,
}

/// Re-walk a course directory and persist the resulting upserts.
///
/// Existing lessons are loaded and the whole tree walked before the write
/// transaction opens, so the database stays unlocked while files are read
/// and their durations measured. A walk error therefore writes nothing; a store error drops
/// the transaction, rolling back every write made for this course.
pub fn register_lessons_for_course(
    conn: &mut Connection,
    course_path: &Path,
    course_id: i64,
    probe: &dyn MediaProbe,
) -> Result<LessonScanReport> {
    let existing = db::find_lessons(conn, course_id)?;
    let scan = walk_course(course_path, course_id, existing, probe)?;

    let tx = conn.transaction()?;
    let counts = db::apply_upserts(&tx, &scan.upserts)?;
    tx.commit()?;

    tracing::info!(
        "Lessons registered for course {}: {} new, {} updated, {} missing on disk",
        course_id,
        counts.inserted,
        counts.updated,
        scan.orphaned.len()
    );

    Ok(LessonScanReport {
        course_id,
        inserted: counts.inserted,
        updated: counts.updated,
        orphaned: scan.orphaned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_courses, list_lessons};
    use crate::domain::{NewCourse, ProgressStatus};
    use crate::error::CatalogError;
    use crate::media::ProbeError;
    use crate::testing::{touch, FixedProbe, TestEnv};
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Stands in for the viewing application: marks every lesson completed
    /// from its own connection each time a duration is requested.
    struct ProgressWriter {
        db_path: PathBuf,
        writes: RefCell<Vec<rusqlite::Result<usize>>>,
    }

    impl MediaProbe for ProgressWriter {
        fn duration_seconds(&self, _path: &Path) -> std::result::Result<f64, ProbeError> {
            let write = Connection::open(&self.db_path).and_then(|other| {
                other.execute(
                    "UPDATE lessons SET progress_status = 'completed', is_completed = 1",
                    [],
                )
            });
            self.writes.borrow_mut().push(write);
            Ok(7.0)
        }
    }

    fn setup(env: &TestEnv) -> (std::path::PathBuf, i64) {
        let course_dir = env.courses_root().join("Rust");
        std::fs::create_dir_all(&course_dir).unwrap();
        let course = insert_courses(
            &env.conn,
            &[NewCourse {
                name: "Rust".into(),
                path: course_dir.to_str().unwrap().to_string(),
            }],
        )
        .unwrap()
        .remove(0);
        (course_dir, course.id)
    }

    #[test]
    fn test_register_then_rescan() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        touch(&dir, "01 Basics/Lesson 1.mp4");
        touch(&dir, "01 Basics/Lesson 1.pdf");
        let probe = FixedProbe::new(90.0);

        let first = register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();
        assert_eq!((first.inserted, first.updated), (2, 0));

        env.conn
            .execute(
                "UPDATE lessons SET progress_status = 'completed', is_completed = 1 WHERE pdf_url = ''",
                [],
            )
            .unwrap();

        let second = register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();
        assert_eq!((second.inserted, second.updated), (0, 2));

        let lessons = list_lessons(&env.conn, course_id).unwrap();
        assert_eq!(lessons.len(), 2);
        let video = lessons.iter().find(|l| l.source.pdf_url().is_empty()).unwrap();
        assert_eq!(video.progress.status, ProgressStatus::Completed);
        assert!(video.progress.is_completed);
        assert_eq!(video.duration, "90");

        let pdf = lessons.iter().find(|l| !l.source.pdf_url().is_empty()).unwrap();
        assert_eq!(pdf.progress.status, ProgressStatus::NotStarted);
        assert_eq!(pdf.duration, "0");

        // Mutual exclusion holds for every stored lesson
        for lesson in &lessons {
            assert!(lesson.source.video_url().is_empty() != lesson.source.pdf_url().is_empty());
        }
    }

    #[test]
    fn test_new_file_added_between_scans() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        touch(&dir, "a.mp4");
        let probe = FixedProbe::new(5.0);
        register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();

        touch(&dir, "b.mp4");
        let report = register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();
        assert_eq!((report.inserted, report.updated), (1, 1));
    }

    #[test]
    fn test_removed_file_keeps_record() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        let file = touch(&dir, "a.mp4");
        let probe = FixedProbe::new(5.0);
        register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();

        std::fs::remove_file(file).unwrap();
        let report = register_lessons_for_course(&mut env.conn, &dir, course_id, &probe).unwrap();
        assert_eq!(report.orphaned, vec![HierarchyPath::parse("a.mp4")]);
        assert_eq!(list_lessons(&env.conn, course_id).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_course_dir_writes_nothing() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        std::fs::remove_dir(&dir).unwrap();

        let err = register_lessons_for_course(&mut env.conn, &dir, course_id, &FixedProbe::new(1.0))
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert!(list_lessons(&env.conn, course_id).unwrap().is_empty());
    }

    #[test]
    fn test_progress_writes_succeed_during_walk() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        touch(&dir, "a.mp4");
        let durations = FixedProbe::new(1.0);
        register_lessons_for_course(&mut env.conn, &dir, course_id, &durations).unwrap();

        let writer = ProgressWriter {
            db_path: env.path().join("catalog.db"),
            writes: RefCell::new(Vec::new()),
        };
        let report = register_lessons_for_course(&mut env.conn, &dir, course_id, &writer).unwrap();
        assert_eq!(report.updated, 1);

        let writes = writer.writes.into_inner();
        assert_eq!(writes.len(), 1);
        assert!(matches!(writes[0], Ok(1)), "progress write failed: {:?}", writes[0]);

        // The scan's own update leaves the concurrent progress write in place
        let lesson = list_lessons(&env.conn, course_id).unwrap().remove(0);
        assert_eq!(lesson.progress.status, ProgressStatus::Completed);
        assert!(lesson.progress.is_completed);
        assert_eq!(lesson.duration, "7");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_writes_nothing() {
        use std::fs::{set_permissions, Permissions};
        use std::os::unix::fs::PermissionsExt;

        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        touch(&dir, "1 - Open/a.mp4");
        touch(&dir, "2 - Locked/b.mp4");
        let durations = FixedProbe::new(3.0);
        register_lessons_for_course(&mut env.conn, &dir, course_id, &durations).unwrap();
        let before = list_lessons(&env.conn, course_id).unwrap();

        // Walked before the locked directory, so it would be inserted first
        touch(&dir, "1 - Open/c.mp4");
        let locked = dir.join("2 - Locked");
        set_permissions(&locked, Permissions::from_mode(0o000)).unwrap();
        let enforced = std::fs::read_dir(&locked).is_err();

        let result = register_lessons_for_course(&mut env.conn, &dir, course_id, &durations);
        set_permissions(&locked, Permissions::from_mode(0o755)).unwrap();

        // root ignores permission bits
        if !enforced {
            return;
        }
        let err = result.unwrap_err();
        assert!(matches!(&err, CatalogError::PermissionDenied { path } if *path == locked));
        assert_eq!(list_lessons(&env.conn, course_id).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_writes_nothing() {
        let mut env = TestEnv::new().unwrap();
        let (dir, course_id) = setup(&env);
        touch(&dir, "Module/a.mp4");
        std::os::unix::fs::symlink("..", dir.join("Module/back")).unwrap();

        let err = register_lessons_for_course(&mut env.conn, &dir, course_id, &FixedProbe::new(1.0))
            .unwrap_err();
        assert!(matches!(err, CatalogError::SymlinkLoop { .. }));
        assert!(list_lessons(&env.conn, course_id).unwrap().is_empty());
    }
}
