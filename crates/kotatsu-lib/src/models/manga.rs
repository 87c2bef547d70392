use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{MangaChapter, MangaSource, MangaState, MangaTag};

/// A type represent manga details, normalized across source
///
/// Values are rebuilt on every fetch; detail loading returns a new value via
/// struct update syntax instead of mutating the listed one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Manga {
    pub id: i64,
    pub source: MangaSource,
    /// Path relative to the site domain
    pub url: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub cover_url: String,
    pub large_cover_url: Option<String>,
    pub state: Option<MangaState>,
    /// Normalized into `0.0..=1.0`, or [`Manga::NO_RATING`]
    pub rating: f32,
    pub description: Option<String>,
    pub author: Option<String>,
    pub is_nsfw: bool,
    pub tags: HashSet<MangaTag>,
    pub chapters: Option<Vec<MangaChapter>>,
}

impl Manga {
    pub const NO_RATING: f32 = -1.0;

    pub fn has_rating(&self) -> bool {
        (0.0..=1.0).contains(&self.rating)
    }
}

impl Default for Manga {
    fn default() -> Self {
        Self {
            id: 0,
            source: MangaSource::Local,
            url: "".to_string(),
            title: "".to_string(),
            alt_title: None,
            cover_url: "".to_string(),
            large_cover_url: None,
            state: None,
            rating: Self::NO_RATING,
            description: None,
            author: None,
            is_nsfw: false,
            tags: HashSet::new(),
            chapters: None,
        }
    }
}

/// Clamps a site supplied score into `0.0..=1.0`, mapping NaN to [`Manga::NO_RATING`].
pub fn normalize_rating(value: f64) -> f32 {
    if value.is_nan() {
        return Manga::NO_RATING;
    }
    value.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_rating() {
        assert_eq!(normalize_rating(0.5), 0.5);
        assert_eq!(normalize_rating(8.7), 1.0);
        assert_eq!(normalize_rating(-3.0), 0.0);
        assert_eq!(normalize_rating(f64::NAN), Manga::NO_RATING);
    }

    #[test]
    fn test_default_has_no_rating() {
        let manga = Manga::default();
        assert!(!manga.has_rating());

        let rated = Manga {
            rating: 0.0,
            ..manga
        };
        assert!(rated.has_rating());
    }
}
