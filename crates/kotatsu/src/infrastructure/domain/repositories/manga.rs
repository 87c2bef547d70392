use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use kotatsu_lib::models::{Manga, MangaSource, MangaState, MangaTag};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::{
    domain::{
        entities::tag::TagEntity,
        repositories::manga::{MangaRepository, MangaRepositoryError},
    },
    infrastructure::database::Pool,
};

pub const MANGA_TABLES: &[&str] = &["manga", "tags", "manga_tags"];

#[derive(Clone)]
pub struct MangaRepositoryImpl {
    pool: Pool,
}

impl MangaRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

fn state_to_str(state: Option<MangaState>) -> Option<&'static str> {
    state.map(|state| match state {
        MangaState::Ongoing => "ONGOING",
        MangaState::Finished => "FINISHED",
    })
}

fn state_from_str(state: Option<String>) -> Option<MangaState> {
    match state.as_deref() {
        Some("ONGOING") => Some(MangaState::Ongoing),
        Some("FINISHED") => Some(MangaState::Finished),
        _ => None,
    }
}

pub(crate) fn tag_from_row(row: &SqliteRow) -> Result<TagEntity, sqlx::Error> {
    Ok(TagEntity {
        id: row.try_get("tag_id")?,
        title: row.try_get("title")?,
        key: row.try_get("key")?,
        source: row.try_get("source")?,
    })
}

fn manga_from_row(row: &SqliteRow, tags: HashSet<MangaTag>) -> Result<Manga, MangaRepositoryError> {
    let source: String = row.try_get("source")?;

    Ok(Manga {
        id: row.try_get("manga_id")?,
        source: source.parse::<MangaSource>()?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        alt_title: row.try_get("alt_title")?,
        cover_url: row.try_get("cover_url")?,
        large_cover_url: row.try_get("large_cover_url")?,
        state: state_from_str(row.try_get("state")?),
        rating: row.try_get::<f64, _>("rating")? as f32,
        description: row.try_get("description")?,
        author: row.try_get("author")?,
        is_nsfw: row.try_get("nsfw")?,
        tags,
        chapters: None,
    })
}

/// Loads manga rows with their tags, keyed by manga id
pub(crate) async fn load_manga(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<HashMap<i64, Manga>, MangaRepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = vec!["?"; ids.len()].join(",");

    let query_str = format!(
        r#"SELECT manga_tags.manga_id AS owner_id, tags.* FROM manga_tags
        INNER JOIN tags ON tags.tag_id = manga_tags.tag_id
        WHERE manga_tags.manga_id IN ({placeholders})"#
    );
    let mut query = sqlx::query(&query_str);
    for id in ids {
        query = query.bind(id);
    }
    let mut tags: HashMap<i64, HashSet<MangaTag>> = HashMap::new();
    for row in query.fetch_all(pool).await? {
        let owner_id: i64 = row.try_get("owner_id")?;
        let tag = MangaTag::try_from(tag_from_row(&row)?)?;
        tags.entry(owner_id).or_default().insert(tag);
    }

    let query_str = format!(r#"SELECT * FROM manga WHERE manga_id IN ({placeholders})"#);
    let mut query = sqlx::query(&query_str);
    for id in ids {
        query = query.bind(id);
    }
    let mut manga = HashMap::with_capacity(ids.len());
    for row in query.fetch_all(pool).await? {
        let id: i64 = row.try_get("manga_id")?;
        let item = manga_from_row(&row, tags.remove(&id).unwrap_or_default())?;
        manga.insert(id, item);
    }

    Ok(manga)
}

#[async_trait]
impl MangaRepository for MangaRepositoryImpl {
    async fn get_manga_by_id(&self, id: i64) -> Result<Manga, MangaRepositoryError> {
        load_manga(&self.pool, &[id])
            .await?
            .remove(&id)
            .ok_or(MangaRepositoryError::DbError(sqlx::Error::RowNotFound))
    }

    async fn get_manga_by_ids(&self, ids: &[i64]) -> Result<Vec<Manga>, MangaRepositoryError> {
        let mut manga = load_manga(&self.pool, ids).await?;

        Ok(ids.iter().filter_map(|id| manga.remove(id)).collect())
    }

    async fn upsert_manga(&self, manga: &Manga) -> Result<(), MangaRepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO manga(
                manga_id,
                title,
                alt_title,
                url,
                rating,
                nsfw,
                cover_url,
                large_cover_url,
                state,
                author,
                description,
                source
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(manga_id)
            DO UPDATE SET
                title=excluded.title,
                alt_title=excluded.alt_title,
                url=excluded.url,
                rating=excluded.rating,
                nsfw=excluded.nsfw,
                cover_url=excluded.cover_url,
                large_cover_url=excluded.large_cover_url,
                state=excluded.state,
                author=excluded.author,
                description=excluded.description,
                source=excluded.source
        "#,
        )
        .bind(manga.id)
        .bind(&manga.title)
        .bind(&manga.alt_title)
        .bind(&manga.url)
        .bind(manga.rating as f64)
        .bind(manga.is_nsfw)
        .bind(&manga.cover_url)
        .bind(&manga.large_cover_url)
        .bind(state_to_str(manga.state))
        .bind(&manga.author)
        .bind(&manga.description)
        .bind(manga.source.key())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM manga_tags WHERE manga_id = ?")
            .bind(manga.id)
            .execute(&mut *tx)
            .await?;

        for tag in manga.tags.iter().map(TagEntity::from) {
            sqlx::query(
                r#"INSERT INTO tags(tag_id, title, key, source) VALUES (?, ?, ?, ?)
                ON CONFLICT(tag_id) DO UPDATE SET title=excluded.title"#,
            )
            .bind(tag.id)
            .bind(&tag.title)
            .bind(&tag.key)
            .bind(&tag.source)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT OR IGNORE INTO manga_tags(manga_id, tag_id) VALUES (?, ?)")
                .bind(manga.id)
                .bind(tag.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.pool.tracker().notify_all(MANGA_TABLES);

        Ok(())
    }
}
