use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cover image chosen in the viewing application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverImage {
  /// Uploaded file, stored by reference
  File(String),
  Url(String),
}

impl CoverImage {
  /// Rebuild from the `is_cover_url` / `file_cover` / `url_cover` columns.
  pub fn from_columns(is_url: bool, file: Option<String>, url: Option<String>) -> Option<Self> {
    if is_url {
      url.map(Self::Url)
    } else {
      file.map(Self::File)
    }
  }
}

/// A top-level directory of learning material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub id: i64,
  pub name: String,
  /// Full path of the course directory; the course identity
  pub path: String,
  pub cover: Option<CoverImage>,
  /// Missing for rows written before creation time was tracked
  pub created_at: Option<DateTime<Utc>>,
}

/// Course directory seen for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
  pub name: String,
  pub path: String,
}
