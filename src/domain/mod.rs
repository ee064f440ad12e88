pub mod course;
pub mod lesson;

pub use course::{CoverImage, Course, NewCourse};
pub use lesson::{
    format_duration, HierarchyPath, Lesson, LessonFileKind, LessonProgress, LessonSource,
    LessonUpsert, NewLesson, ProgressStatus,
};
