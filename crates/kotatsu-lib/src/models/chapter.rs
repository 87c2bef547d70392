use serde::{Deserialize, Serialize};

use super::MangaSource;

/// A type represent chapter, normalized across source
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MangaChapter {
    pub id: i64,
    pub source: MangaSource,
    pub url: String,
    pub name: String,
    /// 1-based position in the list the site returned
    pub number: i32,
}
