use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Manga, MangaChapter, MangaPage, MangaSource, MangaTag, SortOrder};

/// Contract every site adapter implements.
///
/// Implementations perform one or more network calls per operation and do not
/// retry or cache; transport failures and unexpected payloads are returned to
/// the caller as is.
#[async_trait]
pub trait RemoteMangaRepository: Send + Sync {
    fn source(&self) -> MangaSource;

    fn default_domain(&self) -> &'static str;

    fn sort_orders(&self) -> Vec<SortOrder>;

    /// Keys of the settings a user may override for this source
    fn preference_keys(&self) -> Vec<&'static str> {
        vec![]
    }

    async fn get_list(
        &self,
        offset: usize,
        query: Option<&str>,
        sort_order: Option<SortOrder>,
        tag: Option<&MangaTag>,
    ) -> Result<Vec<Manga>>;

    async fn get_details(&self, manga: &Manga) -> Result<Manga>;

    async fn get_pages(&self, chapter: &MangaChapter) -> Result<Vec<MangaPage>>;

    async fn get_tags(&self) -> Result<HashSet<MangaTag>>;
}
