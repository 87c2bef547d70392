use std::collections::HashSet;

use kotatsu_lib::models::{Manga, MangaChapter, MangaPage, MangaSource, MangaTag, SortOrder};
use kotatsu_parsers::manager::SourceManager;
use thiserror::Error;

use crate::domain::repositories::manga::{MangaRepository, MangaRepositoryError};

#[derive(Debug, Error)]
pub enum MangaError {
    #[error("source error: {0}")]
    SourceError(#[from] kotatsu_lib::error::Error),
    #[error("repository error: {0}")]
    RepositoryError(#[from] MangaRepositoryError),
}

/// Catalogue operations, routed to the adapter named by each entity's source
pub struct MangaService<R>
where
    R: MangaRepository,
{
    repo: R,
    sources: SourceManager,
}

impl<R> MangaService<R>
where
    R: MangaRepository,
{
    pub fn new(repo: R, sources: SourceManager) -> Self {
        Self { repo, sources }
    }

    pub fn sources(&self) -> &SourceManager {
        &self.sources
    }

    pub async fn fetch_source_manga(
        &self,
        source: MangaSource,
        offset: usize,
        query: Option<&str>,
        sort_order: Option<SortOrder>,
        tag: Option<&MangaTag>,
    ) -> Result<Vec<Manga>, MangaError> {
        let manga = self
            .sources
            .get(source)?
            .get_list(offset, query, sort_order, tag)
            .await?;

        Ok(manga)
    }

    /// Loads full details and keeps them in the local library
    pub async fn fetch_manga_detail(&self, manga: &Manga) -> Result<Manga, MangaError> {
        let details = self.sources.get(manga.source)?.get_details(manga).await?;
        self.repo.upsert_manga(&details).await?;

        Ok(details)
    }

    pub async fn fetch_pages(&self, chapter: &MangaChapter) -> Result<Vec<MangaPage>, MangaError> {
        Ok(self.sources.get(chapter.source)?.get_pages(chapter).await?)
    }

    pub async fn fetch_tags(&self, source: MangaSource) -> Result<HashSet<MangaTag>, MangaError> {
        Ok(self.sources.get(source)?.get_tags().await?)
    }

    pub async fn get_manga_by_id(&self, id: i64) -> Result<Manga, MangaError> {
        Ok(self.repo.get_manga_by_id(id).await?)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use kotatsu_lib::{
        error::{Error, Result},
        traits::RemoteMangaRepository,
    };

    use super::*;
    use crate::infrastructure::{
        database::establish_in_memory, domain::repositories::manga::MangaRepositoryImpl,
    };

    struct StaticSource;

    #[async_trait]
    impl RemoteMangaRepository for StaticSource {
        fn source(&self) -> MangaSource {
            MangaSource::DesuMe
        }

        fn default_domain(&self) -> &'static str {
            "example.org"
        }

        fn sort_orders(&self) -> Vec<SortOrder> {
            vec![SortOrder::Updated]
        }

        async fn get_list(
            &self,
            offset: usize,
            _query: Option<&str>,
            _sort_order: Option<SortOrder>,
            _tag: Option<&MangaTag>,
        ) -> Result<Vec<Manga>> {
            Ok(vec![Manga {
                id: offset as i64,
                source: MangaSource::DesuMe,
                title: "Listed".to_string(),
                ..Default::default()
            }])
        }

        async fn get_details(&self, manga: &Manga) -> Result<Manga> {
            Ok(Manga {
                description: Some("detailed".to_string()),
                tags: [MangaTag {
                    key: "drama".to_string(),
                    title: "Drama".to_string(),
                    source: MangaSource::DesuMe,
                }]
                .into_iter()
                .collect(),
                ..manga.clone()
            })
        }

        async fn get_pages(&self, _chapter: &MangaChapter) -> Result<Vec<MangaPage>> {
            Err(Error::parse("no pages"))
        }

        async fn get_tags(&self) -> Result<HashSet<MangaTag>> {
            Ok(HashSet::new())
        }
    }

    async fn service() -> MangaService<MangaRepositoryImpl> {
        let pool = establish_in_memory().await.unwrap();
        let mut sources = SourceManager::new();
        sources.insert(Arc::new(StaticSource));

        MangaService::new(MangaRepositoryImpl::new(pool), sources)
    }

    #[tokio::test]
    async fn test_fetch_routes_by_source() {
        let svc = service().await;

        let list = svc
            .fetch_source_manga(MangaSource::DesuMe, 40, None, None, None)
            .await
            .unwrap();
        assert_eq!(list[0].id, 40);

        let err = svc
            .fetch_source_manga(MangaSource::Local, 0, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MangaError::SourceError(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_manga_detail_is_stored() {
        let svc = service().await;
        let manga = Manga {
            id: 12,
            source: MangaSource::DesuMe,
            url: "/manga/api/12".to_string(),
            title: "Stored".to_string(),
            ..Default::default()
        };

        let details = svc.fetch_manga_detail(&manga).await.unwrap();
        let stored = svc.get_manga_by_id(12).await.unwrap();

        assert_eq!(stored.description.as_deref(), Some("detailed"));
        assert_eq!(stored.tags, details.tags);
    }

    #[tokio::test]
    async fn test_parse_error_propagates() {
        let svc = service().await;
        let chapter = MangaChapter {
            id: 1,
            source: MangaSource::DesuMe,
            url: "/c/1".to_string(),
            name: "1".to_string(),
            number: 1,
        };

        let err = svc.fetch_pages(&chapter).await.unwrap_err();
        assert!(matches!(err, MangaError::SourceError(e) if e.is_parse()));
    }
}
