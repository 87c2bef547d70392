use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqliteExecutor, SqlitePool};

use super::manga::{load_manga, tag_from_row};
use crate::{
    domain::{
        entities::{
            suggestion::{SuggestionEntity, SuggestionWithManga},
            tag::TagEntity,
        },
        filter::{build_suggestion_query, ListFilterOption},
        repositories::suggestion::{
            SuggestionRepository, SuggestionRepositoryError, SuggestionStream,
        },
    },
    infrastructure::database::Pool,
};

/// Tables whose writes invalidate suggestion observers
pub const SUGGESTION_TABLES: &[&str] = &["suggestions", "manga", "tags", "manga_tags"];

const SELECT_ALL: &str = "SELECT * FROM suggestions ORDER BY relevance DESC";

#[derive(Clone)]
pub struct SuggestionRepositoryImpl {
    pool: Pool,
}

impl SuggestionRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }

    fn observe_query(&self, query: String) -> SuggestionStream {
        let pool = self.pool.clone();
        self.pool.tracker().observe(SUGGESTION_TABLES, move || {
            let pool = pool.clone();
            let query = query.clone();
            async move { fetch_with_manga(&pool, &query, &[]).await }
        })
    }
}

fn suggestion_from_row(row: &SqliteRow) -> Result<SuggestionEntity, sqlx::Error> {
    Ok(SuggestionEntity {
        manga_id: row.try_get("manga_id")?,
        relevance: row.try_get("relevance")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Runs a select over `suggestions` and attaches the referenced manga, keeping row order
async fn fetch_with_manga(
    pool: &SqlitePool,
    query_str: &str,
    binds: &[i64],
) -> Result<Vec<SuggestionWithManga>, SuggestionRepositoryError> {
    let mut query = sqlx::query(query_str);
    for value in binds {
        query = query.bind(value);
    }
    let suggestions = query
        .fetch_all(pool)
        .await?
        .iter()
        .map(suggestion_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let ids = suggestions.iter().map(|s| s.manga_id).collect::<Vec<_>>();
    let mut manga = load_manga(pool, &ids).await?;

    Ok(suggestions
        .into_iter()
        .filter_map(|suggestion| {
            manga
                .remove(&suggestion.manga_id)
                .map(|manga| SuggestionWithManga { suggestion, manga })
        })
        .collect())
}

async fn insert_with<'e, E>(
    executor: E,
    entity: &SuggestionEntity,
) -> Result<u64, SuggestionRepositoryError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "INSERT OR IGNORE INTO suggestions(manga_id, relevance, created_at) VALUES (?, ?, ?)",
    )
    .bind(entity.manga_id)
    .bind(entity.relevance)
    .bind(entity.created_at)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(rows)
}

async fn update_with<'e, E>(
    executor: E,
    entity: &SuggestionEntity,
) -> Result<u64, SuggestionRepositoryError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("UPDATE suggestions SET relevance = ?, created_at = ? WHERE manga_id = ?")
        .bind(entity.relevance)
        .bind(entity.created_at)
        .bind(entity.manga_id)
        .execute(executor)
        .await?
        .rows_affected();

    Ok(rows)
}

#[async_trait]
impl SuggestionRepository for SuggestionRepositoryImpl {
    fn observe_all(&self) -> SuggestionStream {
        self.observe_query(SELECT_ALL.to_string())
    }

    fn observe_filtered(
        &self,
        limit: usize,
        filter_options: &[ListFilterOption],
    ) -> Result<SuggestionStream, SuggestionRepositoryError> {
        let query = build_suggestion_query(limit, filter_options)?;
        debug!("observe suggestions: {query}");

        Ok(self.observe_query(query))
    }

    async fn get_all(
        &self,
        limit: usize,
        filter_options: &[ListFilterOption],
    ) -> Result<Vec<SuggestionWithManga>, SuggestionRepositoryError> {
        let query = build_suggestion_query(limit, filter_options)?;

        fetch_with_manga(&self.pool, &query, &[]).await
    }

    async fn get_random(&self) -> Result<Option<SuggestionWithManga>, SuggestionRepositoryError> {
        Ok(self.get_random_many(1).await?.into_iter().next())
    }

    async fn get_random_many(
        &self,
        limit: usize,
    ) -> Result<Vec<SuggestionWithManga>, SuggestionRepositoryError> {
        fetch_with_manga(
            &self.pool,
            "SELECT * FROM suggestions ORDER BY RANDOM() LIMIT ?",
            &[limit as i64],
        )
        .await
    }

    async fn count(&self) -> Result<i64, SuggestionRepositoryError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM suggestions")
            .fetch_one(&self.pool as &SqlitePool)
            .await?
            .try_get(0)?;

        Ok(count)
    }

    async fn get_titles(&self, pattern: &str) -> Result<Vec<String>, SuggestionRepositoryError> {
        let titles = sqlx::query(
            r#"SELECT manga.title FROM suggestions
            LEFT JOIN manga ON suggestions.manga_id = manga.manga_id
            WHERE manga.title LIKE ?"#,
        )
        .bind(pattern)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .iter()
        .map(|row| row.try_get(0))
        .collect::<Result<Vec<String>, _>>()?;

        Ok(titles)
    }

    async fn get_top_tags(&self, limit: usize) -> Result<Vec<TagEntity>, SuggestionRepositoryError> {
        let tags = sqlx::query(
            r#"SELECT tags.* FROM suggestions
            INNER JOIN manga_tags ON manga_tags.manga_id = suggestions.manga_id
            INNER JOIN tags ON tags.tag_id = manga_tags.tag_id
            GROUP BY tags.tag_id
            ORDER BY COUNT(tags.tag_id) DESC, tags.title
            LIMIT ?"#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .iter()
        .map(tag_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    async fn insert(&self, entity: &SuggestionEntity) -> Result<bool, SuggestionRepositoryError> {
        let inserted = insert_with(&self.pool as &SqlitePool, entity).await? > 0;
        if inserted {
            self.pool.tracker().notify("suggestions");
        }

        Ok(inserted)
    }

    async fn update(&self, entity: &SuggestionEntity) -> Result<u64, SuggestionRepositoryError> {
        let rows = update_with(&self.pool as &SqlitePool, entity).await?;
        if rows > 0 {
            self.pool.tracker().notify("suggestions");
        }

        Ok(rows)
    }

    async fn upsert(&self, entity: &SuggestionEntity) -> Result<(), SuggestionRepositoryError> {
        let mut tx = self.pool.begin().await?;
        if update_with(&mut *tx, entity).await? == 0 {
            insert_with(&mut *tx, entity).await?;
        }
        tx.commit().await?;

        self.pool.tracker().notify("suggestions");

        Ok(())
    }

    async fn delete_all(&self) -> Result<(), SuggestionRepositoryError> {
        sqlx::query("DELETE FROM suggestions")
            .execute(&self.pool as &SqlitePool)
            .await?;
        self.pool.tracker().notify("suggestions");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use futures::StreamExt;
    use kotatsu_lib::models::Manga;

    use super::*;
    use crate::{
        domain::{filter::FilterMacro, repositories::manga::MangaRepository},
        infrastructure::{
            database::establish_in_memory,
            domain::repositories::manga::{
                test::{manga, tag},
                MangaRepositoryImpl,
            },
        },
    };

    async fn seed() -> (SuggestionRepositoryImpl, Vec<Manga>) {
        let pool = establish_in_memory().await.unwrap();
        let manga_repo = MangaRepositoryImpl::new(pool.clone());
        let suggestions = SuggestionRepositoryImpl::new(pool);

        let library = vec![
            manga(1, "Berserk", true, &["action", "drama"]),
            manga(2, "Bleach", false, &["action"]),
            manga(3, "Nana", true, &["romance", "drama"]),
            manga(4, "Monster", false, &["drama"]),
        ];
        for (i, item) in library.iter().enumerate() {
            manga_repo.upsert_manga(item).await.unwrap();
            suggestions
                .insert(&SuggestionEntity::new(item.id, 0.9 - i as f64 * 0.1))
                .await
                .unwrap();
        }

        (suggestions, library)
    }

    fn titles(list: &[SuggestionWithManga]) -> Vec<&str> {
        list.iter().map(|s| s.manga.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_get_all_orders_by_relevance() {
        let (repo, _) = seed().await;

        let all = repo.get_all(0, &[]).await.unwrap();
        assert_eq!(titles(&all), vec!["Berserk", "Bleach", "Nana", "Monster"]);
        assert!(all[0].manga.tags.contains(&tag("drama")));

        let limited = repo.get_all(2, &[]).await.unwrap();
        assert_eq!(titles(&limited), vec!["Berserk", "Bleach"]);
    }

    #[tokio::test]
    async fn test_get_all_filtered() {
        let (repo, _) = seed().await;

        let nsfw = repo
            .get_all(0, &[ListFilterOption::Macro(FilterMacro::Nsfw)])
            .await
            .unwrap();
        assert_eq!(titles(&nsfw), vec!["Berserk", "Nana"]);

        let tags = repo
            .get_all(
                0,
                &[
                    ListFilterOption::Tag(tag("action")),
                    ListFilterOption::Tag(tag("romance")),
                ],
            )
            .await
            .unwrap();
        assert_eq!(titles(&tags), vec!["Berserk", "Bleach", "Nana"]);

        let both = repo
            .get_all(
                0,
                &[
                    ListFilterOption::Macro(FilterMacro::Nsfw),
                    ListFilterOption::Tag(tag("action")),
                    ListFilterOption::Tag(tag("romance")),
                ],
            )
            .await
            .unwrap();
        assert_eq!(titles(&both), vec!["Berserk", "Nana"]);
    }

    #[tokio::test]
    async fn test_unsupported_filter_is_invalid_argument() {
        let (repo, _) = seed().await;

        let res = repo.observe_filtered(0, &[ListFilterOption::Macro(FilterMacro::Completed)]);
        assert!(matches!(
            res,
            Err(SuggestionRepositoryError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_count_random_titles() {
        let (repo, library) = seed().await;

        assert_eq!(repo.count().await.unwrap(), 4);

        let random = repo.get_random().await.unwrap().unwrap();
        assert!(library.iter().any(|m| m.id == random.manga.id));
        assert_eq!(repo.get_random_many(3).await.unwrap().len(), 3);
        assert_eq!(repo.get_random_many(10).await.unwrap().len(), 4);

        let mut found = repo.get_titles("B%").await.unwrap();
        found.sort();
        assert_eq!(found, vec!["Berserk", "Bleach"]);
    }

    #[tokio::test]
    async fn test_top_tags() {
        let (repo, _) = seed().await;

        let top = repo.get_top_tags(2).await.unwrap();

        assert_eq!(
            top.iter().map(|t| t.key.as_str()).collect::<Vec<_>>(),
            vec!["drama", "action"]
        );
        assert_eq!(top[0].id, TagEntity::id_for(&tag("drama")));
    }

    #[tokio::test]
    async fn test_upsert_inserts_missing_row() {
        let pool = establish_in_memory().await.unwrap();
        let manga_repo = MangaRepositoryImpl::new(pool.clone());
        let repo = SuggestionRepositoryImpl::new(pool);
        let item = manga(7, "Vagabond", false, &[]);
        manga_repo.upsert_manga(&item).await.unwrap();

        repo.upsert(&SuggestionEntity::new(item.id, 0.4)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let all = repo.get_all(0, &[]).await.unwrap();
        assert_eq!(all[0].suggestion.relevance, 0.4);
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_row() {
        let (repo, library) = seed().await;

        let entity = SuggestionEntity::new(library[3].id, 2.0);
        assert_eq!(repo.update(&entity).await.unwrap(), 1);
        repo.upsert(&SuggestionEntity::new(library[3].id, 3.0))
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 4);
        let all = repo.get_all(0, &[]).await.unwrap();
        assert_eq!(all[0].manga.title, "Monster");
        assert_eq!(all[0].suggestion.relevance, 3.0);
    }

    #[tokio::test]
    async fn test_insert_ignores_existing_row() {
        let (repo, library) = seed().await;

        let inserted = repo
            .insert(&SuggestionEntity::new(library[0].id, 0.0))
            .await
            .unwrap();

        assert!(!inserted);
        assert_eq!(repo.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let (repo, _) = seed().await;

        repo.delete_all().await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.get_random().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_observe_reemits_after_write() {
        let (repo, library) = seed().await;
        let mut stream = repo
            .observe_filtered(0, &[ListFilterOption::Macro(FilterMacro::Nsfw)])
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(titles(&first), vec!["Berserk", "Nana"]);

        // unrelated to the predicate, observers are still notified
        repo.upsert(&SuggestionEntity::new(library[1].id, 5.0))
            .await
            .unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(titles(&second), vec!["Berserk", "Nana"]);

        repo.delete_all().await.unwrap();
        let third = stream.next().await.unwrap().unwrap();
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_observe_all() {
        let (repo, _) = seed().await;
        let mut stream = repo.observe_all();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 4);

        repo.delete_all().await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_observe_reemits_after_manga_write() {
        let pool = establish_in_memory().await.unwrap();
        let manga_repo = MangaRepositoryImpl::new(pool.clone());
        let repo = SuggestionRepositoryImpl::new(pool);
        let item = manga(2, "Bleach", false, &["action"]);
        manga_repo.upsert_manga(&item).await.unwrap();
        repo.insert(&SuggestionEntity::new(item.id, 0.5)).await.unwrap();

        let mut stream = repo.observe_all();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(titles(&first), vec!["Bleach"]);

        let renamed = Manga {
            title: "Bleach: Thousand-Year Blood War".to_string(),
            tags: [tag("action"), tag("supernatural")].into_iter().collect(),
            ..item
        };
        manga_repo.upsert_manga(&renamed).await.unwrap();

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(titles(&second), vec!["Bleach: Thousand-Year Blood War"]);
        assert!(second[0].manga.tags.contains(&tag("supernatural")));
    }
}
