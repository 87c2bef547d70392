use serde::{Deserialize, Serialize};

use super::MangaSource;

/// A site-native category, used both as list filter and as manga metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct MangaTag {
    pub key: String,
    pub title: String,
    pub source: MangaSource,
}
