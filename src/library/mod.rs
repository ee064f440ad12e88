//! Reconciliation of on-disk course material with the catalog.
//!
//! # Layout on disk
//!
//! ```text
//! <courses root>/
//! ├── Course A/            one course per immediate subdirectory
//! │   ├── 1 - Intro/
//! │   │   ├── 1 - Welcome.mp4
//! │   │   └── Slides.pdf
//! │   └── 2 - Basics.mp4
//! └── Course B/
//! ```
//!
//! # Scan lifecycle
//!
//! 1. **Discovery**: immediate subdirectories of the root not yet stored as a
//!    course are inserted in one transaction
//! 2. **Walk**: each new course directory is traversed depth first, entries in
//!    natural order; supported files become lesson upserts keyed by their
//!    hierarchy path
//! 3. **Merge**: known lessons get location and duration refreshed, progress
//!    untouched; unknown files become new lessons
//! 4. **Commit**: one transaction per course, opened only after the walk so
//!    the viewing application can keep writing progress meanwhile

pub mod discovery;
pub mod registration;
pub mod sort;
pub mod walker;

pub use discovery::{find_new_course_dirs, scan_and_register_new_courses, CourseDir, CourseScan};
pub use registration::{register_lessons_for_course, LessonScanReport};
pub use sort::{natural_cmp, sort_natural_by_key};
pub use walker::{walk_course, LessonFile, LessonFiles, LessonScan};
