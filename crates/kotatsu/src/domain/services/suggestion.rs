use kotatsu_lib::models::Manga;
use thiserror::Error;

use crate::domain::{
    entities::suggestion::SuggestionEntity,
    repositories::{
        manga::{MangaRepository, MangaRepositoryError},
        suggestion::{SuggestionRepository, SuggestionRepositoryError},
    },
};

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] SuggestionRepositoryError),
    #[error("manga repository error: {0}")]
    MangaRepositoryError(#[from] MangaRepositoryError),
}

pub struct SuggestionService<S, M>
where
    S: SuggestionRepository,
    M: MangaRepository,
{
    repo: S,
    manga_repo: M,
}

impl<S, M> SuggestionService<S, M>
where
    S: SuggestionRepository,
    M: MangaRepository,
{
    pub fn new(repo: S, manga_repo: M) -> Self {
        Self { repo, manga_repo }
    }

    pub fn repo(&self) -> &S {
        &self.repo
    }

    /// Stores `manga` in the library and ranks it with `relevance`
    pub async fn suggest(&self, manga: &Manga, relevance: f64) -> Result<(), SuggestionError> {
        self.manga_repo.upsert_manga(manga).await?;
        self.repo
            .upsert(&SuggestionEntity::new(manga.id, relevance))
            .await?;

        Ok(())
    }

    /// Replaces the whole suggestion list
    pub async fn replace_all(&self, suggestions: &[(Manga, f64)]) -> Result<(), SuggestionError> {
        self.repo.delete_all().await?;
        for (manga, relevance) in suggestions {
            self.suggest(manga, *relevance).await?;
        }
        info!("stored {} suggestions", suggestions.len());

        Ok(())
    }
}
