use async_trait::async_trait;
use kotatsu_lib::models::Manga;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MangaRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("invalid row: {0}")]
    InvalidRow(#[from] kotatsu_lib::error::Error),
}

#[async_trait]
pub trait MangaRepository: Send + Sync {
    async fn get_manga_by_id(&self, id: i64) -> Result<Manga, MangaRepositoryError>;

    async fn get_manga_by_ids(&self, ids: &[i64]) -> Result<Vec<Manga>, MangaRepositoryError>;

    /// Stores the manga row and replaces its tags
    async fn upsert_manga(&self, manga: &Manga) -> Result<(), MangaRepositoryError>;
}
