use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::{
    entities::{
        suggestion::{SuggestionEntity, SuggestionWithManga},
        tag::TagEntity,
    },
    filter::{FilterError, ListFilterOption},
    repositories::manga::MangaRepositoryError,
};

#[derive(Debug, Error)]
pub enum SuggestionRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] FilterError),
    #[error("invalid row: {0}")]
    InvalidRow(#[from] kotatsu_lib::error::Error),
    #[error(transparent)]
    Manga(#[from] MangaRepositoryError),
}

pub type SuggestionStream =
    BoxStream<'static, Result<Vec<SuggestionWithManga>, SuggestionRepositoryError>>;

#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    /// All suggestions by descending relevance, re-emitted after every write
    fn observe_all(&self) -> SuggestionStream;

    /// Like [`SuggestionRepository::observe_all`], narrowed by `filter_options`.
    /// Options the suggestion list cannot express are rejected up front.
    fn observe_filtered(
        &self,
        limit: usize,
        filter_options: &[ListFilterOption],
    ) -> Result<SuggestionStream, SuggestionRepositoryError>;

    async fn get_all(
        &self,
        limit: usize,
        filter_options: &[ListFilterOption],
    ) -> Result<Vec<SuggestionWithManga>, SuggestionRepositoryError>;

    async fn get_random(&self) -> Result<Option<SuggestionWithManga>, SuggestionRepositoryError>;

    async fn get_random_many(
        &self,
        limit: usize,
    ) -> Result<Vec<SuggestionWithManga>, SuggestionRepositoryError>;

    async fn count(&self) -> Result<i64, SuggestionRepositoryError>;

    /// Titles of suggested manga matching a `LIKE` pattern
    async fn get_titles(&self, pattern: &str) -> Result<Vec<String>, SuggestionRepositoryError>;

    /// Tags ranked by how many suggested manga carry them
    async fn get_top_tags(&self, limit: usize) -> Result<Vec<TagEntity>, SuggestionRepositoryError>;

    /// Inserts unless a row with the same manga id exists; returns whether a row was added
    async fn insert(&self, entity: &SuggestionEntity) -> Result<bool, SuggestionRepositoryError>;

    /// Returns the number of updated rows
    async fn update(&self, entity: &SuggestionEntity) -> Result<u64, SuggestionRepositoryError>;

    async fn upsert(&self, entity: &SuggestionEntity) -> Result<(), SuggestionRepositoryError>;

    async fn delete_all(&self) -> Result<(), SuggestionRepositoryError>;
}
