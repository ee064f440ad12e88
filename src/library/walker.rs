//! Lesson tree walking - turning a course directory into lesson upserts.
//!
//! [`LessonFiles`] lazily yields every supported file below a course root,
//! depth first, each directory's entries in natural order. [`walk_course`]
//! merges those files against the lessons already stored for the course.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use super::sort::natural_cmp;
use crate::db::LogOnError;
use crate::domain::{
    format_duration, HierarchyPath, Lesson, LessonFileKind, LessonSource, LessonUpsert, NewLesson,
};
use crate::error::{CatalogError, Result};
use crate::media::MediaProbe;

/// Walk of `root` following symlinks, each directory's entries in natural
/// order of name.
pub(crate) fn sorted_walk(root: &Path) -> WalkDir {
    WalkDir::new(root).follow_links(true).sort_by(|a, b| {
        natural_cmp(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
    })
}

/// Entry filter dropping names that are not valid UTF-8, subtree included.
/// Such a name could only be stored lossily.
fn has_storable_name(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || entry.file_name().to_str().is_some() {
        return true;
    }
    tracing::warn!("Skipping {}: name is not valid UTF-8", entry.path().display());
    false
}

/// Convert a walk error. Dangling symlinks give `None` and are skipped like
/// any other entry that is not a lesson.
pub(crate) fn walk_error(err: walkdir::Error) -> Option<CatalogError> {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    if let Some(ancestor) = err.loop_ancestor() {
        return Some(CatalogError::SymlinkLoop {
            ancestor: ancestor.to_path_buf(),
            path,
        });
    }

    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("directory walk failed"));
    if source.kind() == io::ErrorKind::NotFound && is_symlink(&path) {
        tracing::trace!("Skipping dangling symlink {}", path.display());
        return None;
    }
    Some(CatalogError::io(path, source))
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}

/// Fail early with a precise error when a root is missing or not a directory.
pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| CatalogError::io(path, e))?;
    if !meta.is_dir() {
        return Err(CatalogError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// A supported lesson file found under a course root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFile {
    pub path: PathBuf,
    pub hierarchy_path: HierarchyPath,
    pub kind: LessonFileKind,
}

impl LessonFile {
    /// File name without its extension.
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

type Entries = FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>;

/// Depth-first iterator over the supported files of a course directory.
///
/// A directory is only read when the walk reaches it. After an error the
/// iterator is exhausted.
pub struct LessonFiles {
    root: PathBuf,
    entries: Entries,
    failed: bool,
}

impl LessonFiles {
    pub fn new(root: &Path) -> Result<Self> {
        ensure_dir(root)?;
        let entries = sorted_walk(root)
            .into_iter()
            .filter_entry(has_storable_name as fn(&DirEntry) -> bool);
        Ok(Self {
            root: root.to_path_buf(),
            entries,
            failed: false,
        })
    }

    fn lesson_file(&self, entry: DirEntry) -> Option<LessonFile> {
        if !entry.file_type().is_file() {
            return None;
        }
        let Some(kind) = LessonFileKind::from_path(entry.path()) else {
            tracing::trace!("Skipping unsupported file {}", entry.path().display());
            return None;
        };
        let hierarchy_path = entry
            .path()
            .strip_prefix(&self.root)
            .ok()
            .and_then(HierarchyPath::from_relative)?;
        Some(LessonFile {
            path: entry.into_path(),
            hierarchy_path,
            kind,
        })
    }
}

impl fmt::Debug for LessonFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonFiles")
            .field("root", &self.root)
            .field("failed", &self.failed)
            .finish()
    }
}

impl Iterator for LessonFiles {
    type Item = Result<LessonFile>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if let Some(file) = self.lesson_file(entry) {
                        return Some(Ok(file));
                    }
                }
                Err(err) => {
                    if let Some(e) = walk_error(err) {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

/// Result of walking one course directory.
#[derive(Debug, Clone, Default)]
pub struct LessonScan {
    /// Updates and inserts in traversal order
    pub upserts: Vec<LessonUpsert>,
    /// Stored lessons whose file was not seen in this walk, sorted
    pub orphaned: Vec<HierarchyPath>,
}

impl LessonScan {
    pub fn inserted(&self) -> usize {
        self.upserts.iter().filter(|u| u.is_insert()).count()
    }

    pub fn updated(&self) -> usize {
        self.upserts.len() - self.inserted()
    }
}

/// Walk a course directory and merge every lesson file against `existing`.
///
/// `existing` is the stored state of the course at the start of the walk,
/// keyed by hierarchy path. A found lesson gets its location and duration
/// refreshed and nothing else; an unknown file becomes a new lesson with
/// default progress. Only video files are probed for a duration; a failed
/// probe records "0". The store is not touched.
pub fn walk_course(
    directory: &Path,
    course_id: i64,
    mut existing: HashMap<HierarchyPath, Lesson>,
    probe: &dyn MediaProbe,
) -> Result<LessonScan> {
    let mut upserts = Vec::new();

    for file in LessonFiles::new(directory)? {
        let file = file?;
        let Some(source) = LessonSource::for_file(file.kind, &file.path) else {
            tracing::warn!("Skipping {}: path is not valid UTF-8", file.path.display());
            continue;
        };
        let duration = if file.kind.is_media() {
            format_duration(
                probe
                    .duration_seconds(&file.path)
                    .log_warn_default("Duration probe failed"),
            )
        } else {
            "0".to_string()
        };

        match existing.remove(&file.hierarchy_path) {
            Some(mut lesson) => {
                tracing::debug!("Updating lesson: {} - {}", lesson.title, file.path.display());
                lesson.source = source;
                lesson.duration = duration;
                upserts.push(LessonUpsert::Update(lesson));
            }
            None => {
                let title = file.title();
                tracing::debug!("Registering new lesson: {} - {}", title, file.path.display());
                upserts.push(LessonUpsert::Insert(NewLesson::new(
                    course_id,
                    title,
                    file.hierarchy_path,
                    source,
                    duration,
                )));
            }
        }
    }

    let mut orphaned: Vec<HierarchyPath> = existing.into_keys().collect();
    orphaned.sort();
    for path in &orphaned {
        tracing::warn!("Lesson {} of course {} no longer found on disk", path, course_id);
    }

    Ok(LessonScan { upserts, orphaned })
}
