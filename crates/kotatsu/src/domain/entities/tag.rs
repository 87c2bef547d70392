use kotatsu_lib::{models::MangaTag, uid::generate_uid_str};
use serde::Serialize;

/// Row of the `tags` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntity {
    pub id: i64,
    pub title: String,
    pub key: String,
    pub source: String,
}

impl TagEntity {
    /// Primary key of a tag, derived from its source and key
    pub fn id_for(tag: &MangaTag) -> i64 {
        generate_uid_str(tag.source, &tag.key)
    }
}

impl From<&MangaTag> for TagEntity {
    fn from(tag: &MangaTag) -> Self {
        Self {
            id: Self::id_for(tag),
            title: tag.title.clone(),
            key: tag.key.clone(),
            source: tag.source.key().to_string(),
        }
    }
}

impl TryFrom<TagEntity> for MangaTag {
    type Error = kotatsu_lib::error::Error;

    fn try_from(entity: TagEntity) -> Result<Self, Self::Error> {
        Ok(MangaTag {
            key: entity.key,
            title: entity.title,
            source: entity.source.parse()?,
        })
    }
}
