use chrono::NaiveDateTime;
use kotatsu_lib::models::Manga;
use serde::Serialize;

/// Row of the `suggestions` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionEntity {
    pub manga_id: i64,
    pub relevance: f64,
    pub created_at: NaiveDateTime,
}

impl SuggestionEntity {
    pub fn new(manga_id: i64, relevance: f64) -> Self {
        Self {
            manga_id,
            relevance,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionWithManga {
    pub suggestion: SuggestionEntity,
    pub manga: Manga,
}
