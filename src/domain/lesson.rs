use std::fmt;
use std::path::{Component, Path};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Position of a lesson file inside its course directory.
///
/// Holds the directory names from the course root down to the file, with the
/// file name (extension included) as the last segment. Two files in the same
/// directory therefore never share a path. The `/`-joined form only exists at
/// the store boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    /// Empty path denoting the course root itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path extended by one segment.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Slash-joined form used as the persisted key.
    pub fn join(&self) -> String {
        self.0.join("/")
    }

    /// Path of a file relative to its course root.
    ///
    /// `None` when a component is not valid UTF-8 or not a plain name.
    pub fn from_relative(relative: &Path) -> Option<Self> {
        relative
            .components()
            .map(|c| match c {
                Component::Normal(name) => name.to_str().map(String::from),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Parse a persisted key. Empty segments are dropped.
    pub fn parse(joined: &str) -> Self {
        Self(
            joined
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join())
    }
}

impl ToSql for HierarchyPath {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.join()))
    }
}

impl FromSql for HierarchyPath {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(HierarchyPath::parse)
    }
}

/// Kind of lesson file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonFileKind {
    Video,
    Pdf,
    Text,
    Html,
}

/// Extensions registered as playable video.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "ts", "mov", "wmv", "flv", "mkv", "webm"];

impl LessonFileKind {
    /// Classify by lowercase extension. `None` means the file is not a lesson.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "html" => Some(Self::Html),
            e if VIDEO_EXTENSIONS.contains(&e) => Some(Self::Video),
            _ => None,
        }
    }

    /// Classify by whatever follows the last `.` of the file name, so a file
    /// named just `.mp4` still counts as video.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Only video files carry a duration worth probing.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Video)
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Where a lesson's content lives.
///
/// PDFs are served from `pdf_url`; everything else (video, text, markup) from
/// `video_url`. Exactly one of the two columns is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonSource {
    Video(String),
    Pdf(String),
}

impl LessonSource {
    /// `None` when the path is not valid UTF-8 and cannot be stored.
    pub fn for_file(kind: LessonFileKind, path: &Path) -> Option<Self> {
        let location = path.to_str()?.to_string();
        Some(if kind.is_pdf() {
            Self::Pdf(location)
        } else {
            Self::Video(location)
        })
    }

    /// Rebuild from the two persisted columns. A non-empty `pdf_url` wins.
    pub fn from_columns(video_url: String, pdf_url: String) -> Self {
        if pdf_url.is_empty() {
            Self::Video(video_url)
        } else {
            Self::Pdf(pdf_url)
        }
    }

    pub fn video_url(&self) -> &str {
        match self {
            Self::Video(url) => url,
            Self::Pdf(_) => "",
        }
    }

    pub fn pdf_url(&self) -> &str {
        match self {
            Self::Video(_) => "",
            Self::Pdf(url) => url,
        }
    }
}

/// User progress status. Written by the viewing application, not by scans.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    /// Value this crate does not know about, kept verbatim.
    Other(String),
}

impl ProgressStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "not_started" => Self::NotStarted,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl ToSql for ProgressStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ProgressStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(ProgressStatus::from_str)
    }
}

/// Progress fields. Set once at creation, never touched by a rescan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub status: ProgressStatus,
    pub is_completed: bool,
    /// Seconds watched, string-encoded like `duration`
    pub time_elapsed: String,
}

impl Default for LessonProgress {
    fn default() -> Self {
        Self {
            status: ProgressStatus::NotStarted,
            is_completed: false,
            time_elapsed: "0".to_string(),
        }
    }
}

/// Persisted lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub module: String,
    pub hierarchy_path: HierarchyPath,
    pub source: LessonSource,
    /// Seconds, string-encoded; "0" for anything that is not video
    pub duration: String,
    pub progress: LessonProgress,
}

/// Lesson observed on disk for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLesson {
    pub course_id: i64,
    pub title: String,
    pub module: String,
    pub hierarchy_path: HierarchyPath,
    pub source: LessonSource,
    pub duration: String,
    pub progress: LessonProgress,
}

impl NewLesson {
    pub fn new(
        course_id: i64,
        title: String,
        hierarchy_path: HierarchyPath,
        source: LessonSource,
        duration: String,
    ) -> Self {
        Self {
            course_id,
            title,
            module: hierarchy_path.join(),
            hierarchy_path,
            source,
            duration,
            progress: LessonProgress::default(),
        }
    }
}

/// One write produced by a course walk.
#[derive(Debug, Clone, PartialEq)]
pub enum LessonUpsert {
    /// Existing lesson with refreshed location and duration
    Update(Lesson),
    Insert(NewLesson),
}

impl LessonUpsert {
    pub fn hierarchy_path(&self) -> &HierarchyPath {
        match self {
            Self::Update(l) => &l.hierarchy_path,
            Self::Insert(l) => &l.hierarchy_path,
        }
    }

    pub fn source(&self) -> &LessonSource {
        match self {
            Self::Update(l) => &l.source,
            Self::Insert(l) => &l.source,
        }
    }

    pub fn duration(&self) -> &str {
        match self {
            Self::Update(l) => &l.duration,
            Self::Insert(l) => &l.duration,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert(_))
    }
}

/// Render probed seconds the way the `duration` column stores them.
///
/// Whole numbers drop the fraction (`12.0` → `"12"`); anything negative or
/// not finite is stored as `"0"`.
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_finite() && seconds > 0.0 {
        format!("{}", seconds)
    } else {
        "0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_hierarchy_path_join_and_parse() {
        let path = HierarchyPath::root().child("Module 1").child("Intro.mp4");
        assert_eq!(path.join(), "Module 1/Intro.mp4");
        assert_eq!(HierarchyPath::parse("Module 1/Intro.mp4"), path);
        assert!(HierarchyPath::parse("").is_root());
    }

    #[test]
    fn test_hierarchy_path_distinguishes_siblings() {
        let dir = HierarchyPath::root().child("Module 1");
        assert_ne!(dir.child("a.mp4"), dir.child("b.mp4"));
    }

    #[test]
    fn test_file_kind_classification() {
        assert_eq!(LessonFileKind::from_extension("MP4"), Some(LessonFileKind::Video));
        assert_eq!(LessonFileKind::from_extension("webm"), Some(LessonFileKind::Video));
        assert_eq!(LessonFileKind::from_extension("pdf"), Some(LessonFileKind::Pdf));
        assert_eq!(LessonFileKind::from_extension("txt"), Some(LessonFileKind::Text));
        assert_eq!(LessonFileKind::from_extension("html"), Some(LessonFileKind::Html));
        assert_eq!(LessonFileKind::from_extension("docx"), None);
        assert_eq!(LessonFileKind::from_path(&PathBuf::from("README")), None);
        assert_eq!(
            LessonFileKind::from_path(&PathBuf::from("a.tar.PDF")),
            Some(LessonFileKind::Pdf)
        );
    }

    #[test]
    fn test_extension_only_file_name_is_classified() {
        assert_eq!(LessonFileKind::from_path(Path::new("/c/.mp4")), Some(LessonFileKind::Video));
        assert_eq!(LessonFileKind::from_path(Path::new("/c/.pdf")), Some(LessonFileKind::Pdf));
        assert_eq!(LessonFileKind::from_path(Path::new("/c/.hidden")), None);
    }

    #[test]
    fn test_hierarchy_path_from_relative() {
        let path = HierarchyPath::from_relative(Path::new("Module 1/Intro.mp4")).unwrap();
        assert_eq!(path, HierarchyPath::root().child("Module 1").child("Intro.mp4"));
        assert!(HierarchyPath::from_relative(Path::new("../escape.mp4")).is_none());
    }

    #[test]
    fn test_only_video_is_media() {
        assert!(LessonFileKind::Video.is_media());
        assert!(!LessonFileKind::Text.is_media());
        assert!(!LessonFileKind::Html.is_media());
        assert!(!LessonFileKind::Pdf.is_media());
    }

    #[test]
    fn test_source_columns_are_exclusive() {
        let pdf = LessonSource::for_file(LessonFileKind::Pdf, Path::new("/c/a.pdf")).unwrap();
        assert_eq!(pdf.pdf_url(), "/c/a.pdf");
        assert_eq!(pdf.video_url(), "");

        let text = LessonSource::for_file(LessonFileKind::Text, Path::new("/c/a.txt")).unwrap();
        assert_eq!(text.video_url(), "/c/a.txt");
        assert_eq!(text.pdf_url(), "");
    }

    #[test]
    fn test_progress_status_round_trips_unknown_values() {
        assert_eq!(ProgressStatus::from_str("completed"), ProgressStatus::Completed);
        let other = ProgressStatus::from_str("paused");
        assert_eq!(other.as_str(), "paused");
    }

    #[test]
    fn test_new_lesson_defaults() {
        let path = HierarchyPath::root().child("1 - Start.mp4");
        let lesson = NewLesson::new(
            7,
            "1 - Start".to_string(),
            path.clone(),
            LessonSource::Video("/c/1 - Start.mp4".to_string()),
            "12".to_string(),
        );
        assert_eq!(lesson.module, path.join());
        assert_eq!(lesson.progress.status, ProgressStatus::NotStarted);
        assert!(!lesson.progress.is_completed);
        assert_eq!(lesson.progress.time_elapsed, "0");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0");
        assert_eq!(format_duration(12.0), "12");
        assert_eq!(format_duration(12.5), "12.5");
        assert_eq!(format_duration(-3.0), "0");
        assert_eq!(format_duration(f64::NAN), "0");
    }
}
