use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use kotatsu_lib::{
    error::{Error, Result},
    models::*,
    traits::RemoteMangaRepository,
    uid::generate_uid,
};
use once_cell::sync::Lazy;
use scraper::Selector;
use serde::Deserialize;

use super::parse_response;
use crate::{
    context::{parse_html, HttpLoader},
    settings::{SourceSettings, KEY_DOMAIN},
};

const PAGE_SIZE: usize = 20;

static GENRES_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#animeFilter .catalog-genres").expect("valid selector"));
static LI_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("valid selector"));
static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input").expect("valid selector"));
static LABEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("label").expect("valid selector"));

#[derive(Debug, Deserialize)]
struct MangaItem {
    id: i64,
    russian: String,
    name: String,
    image: Cover,
    ongoing: i64,
    score: f64,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cover {
    preview: String,
    original: String,
}

#[derive(Debug, Deserialize)]
struct MangaDetails {
    genres: Vec<Genre>,
    #[serde(default)]
    description: Option<String>,
    chapters: ChapterList,
}

#[derive(Debug, Deserialize)]
struct Genre {
    text: String,
    russian: String,
}

#[derive(Debug, Deserialize)]
struct ChapterList {
    list: Vec<ChapterItem>,
}

#[derive(Debug, Deserialize)]
struct ChapterItem {
    id: i64,
    #[serde(default)]
    ch: Option<f64>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChapterDetails {
    pages: PageList,
}

#[derive(Debug, Deserialize)]
struct PageList {
    list: Vec<PageItem>,
}

#[derive(Debug, Deserialize)]
struct PageItem {
    id: i64,
    img: String,
}

pub struct DesuMeRepository {
    loader: Arc<dyn HttpLoader>,
    settings: SourceSettings,
}

impl DesuMeRepository {
    pub fn new(loader: Arc<dyn HttpLoader>, settings: SourceSettings) -> Self {
        Self { loader, settings }
    }

    fn domain(&self) -> &str {
        self.settings.domain_or(self.default_domain())
    }

    fn with_domain(&self, path: &str) -> String {
        if path.starts_with("https://") || path.starts_with("http://") {
            path.to_string()
        } else {
            format!("https://{}{}", self.domain(), path)
        }
    }

    fn list_url(
        &self,
        offset: usize,
        query: Option<&str>,
        sort_order: Option<SortOrder>,
        tag: Option<&MangaTag>,
    ) -> String {
        let mut url = format!(
            "https://{}/manga/api/?limit={}&order={}&page={}",
            self.domain(),
            PAGE_SIZE,
            sort_key(sort_order),
            offset / PAGE_SIZE + 1
        );
        if let Some(tag) = tag {
            url.push_str("&genres=");
            url.push_str(&urlencoding::encode(&tag.key));
        }
        if let Some(query) = query {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(query));
        }

        url
    }
}

/// Maps an abstract sort order onto the site's `order` parameter
pub fn sort_key(sort_order: Option<SortOrder>) -> &'static str {
    match sort_order {
        Some(SortOrder::Alphabetical) => "name",
        Some(SortOrder::Popularity) => "popular",
        Some(SortOrder::Updated) => "updated",
        Some(SortOrder::Newest) => "id",
        _ => "updated",
    }
}

fn map_manga(item: MangaItem) -> Manga {
    Manga {
        id: generate_uid(MangaSource::DesuMe, item.id),
        source: MangaSource::DesuMe,
        url: format!("/manga/api/{}", item.id),
        title: item.russian,
        alt_title: Some(item.name),
        cover_url: item.image.preview,
        large_cover_url: Some(item.image.original),
        state: (item.ongoing == 1).then_some(MangaState::Ongoing),
        rating: normalize_rating(item.score),
        description: item.description,
        ..Default::default()
    }
}

fn map_chapters(manga: &Manga, list: Vec<ChapterItem>) -> Result<Vec<MangaChapter>> {
    let base_chapter_url = format!("{}/chapter/", manga.url);

    list.into_iter()
        .enumerate()
        .map(|(i, item)| {
            let name = match (item.title, item.ch) {
                (Some(title), _) => title,
                // fractional form, `7` renders as `7.0`
                (None, Some(ch)) => format!("{} #{:?}", manga.title, ch),
                _ => {
                    return Err(Error::parse(format!(
                        "chapter {} has neither title nor number",
                        item.id
                    )));
                }
            };

            Ok(MangaChapter {
                id: generate_uid(manga.source, item.id),
                source: manga.source,
                url: format!("{base_chapter_url}{}", item.id),
                name,
                number: i as i32 + 1,
            })
        })
        .collect()
}

fn parse_tags(body: &str, source: MangaSource) -> Result<HashSet<MangaTag>> {
    let doc = parse_html(body);
    let root = doc
        .select(&GENRES_SELECTOR)
        .next()
        .ok_or_else(|| Error::parse("genre filter not found"))?;

    root.select(&LI_SELECTOR)
        .map(|li| {
            let key = li
                .select(&INPUT_SELECTOR)
                .next()
                .and_then(|input| input.value().attr("data-genre"))
                .ok_or_else(|| Error::parse("genre input not found"))?;
            let title = li
                .select(&LABEL_SELECTOR)
                .next()
                .ok_or_else(|| Error::parse("genre label not found"))?
                .text()
                .collect::<String>();

            Ok(MangaTag {
                key: key.to_string(),
                title: title.trim().to_string(),
                source,
            })
        })
        .collect()
}

#[async_trait]
impl RemoteMangaRepository for DesuMeRepository {
    fn source(&self) -> MangaSource {
        MangaSource::DesuMe
    }

    fn default_domain(&self) -> &'static str {
        "desu.me"
    }

    fn sort_orders(&self) -> Vec<SortOrder> {
        vec![
            SortOrder::Updated,
            SortOrder::Popularity,
            SortOrder::Newest,
            SortOrder::Alphabetical,
        ]
    }

    fn preference_keys(&self) -> Vec<&'static str> {
        vec![KEY_DOMAIN]
    }

    async fn get_list(
        &self,
        offset: usize,
        query: Option<&str>,
        sort_order: Option<SortOrder>,
        tag: Option<&MangaTag>,
    ) -> Result<Vec<Manga>> {
        let url = self.list_url(offset, query, sort_order, tag);
        let body = self.loader.get_text(&url).await?;
        let items: Vec<MangaItem> = parse_response(&body)?;

        Ok(items.into_iter().map(map_manga).collect())
    }

    async fn get_details(&self, manga: &Manga) -> Result<Manga> {
        let url = self.with_domain(&manga.url);
        let body = self.loader.get_text(&url).await?;
        let details: MangaDetails = parse_response(&body)?;

        let chapters = map_chapters(manga, details.chapters.list)?;
        let tags = details
            .genres
            .into_iter()
            .map(|genre| MangaTag {
                key: genre.text,
                title: genre.russian,
                source: manga.source,
            })
            .collect();

        Ok(Manga {
            tags,
            description: details.description,
            chapters: Some(chapters),
            ..manga.clone()
        })
    }

    async fn get_pages(&self, chapter: &MangaChapter) -> Result<Vec<MangaPage>> {
        let full_url = self.with_domain(&chapter.url);
        let body = self.loader.get_text(&full_url).await?;
        let details: ChapterDetails = parse_response(&body)?;

        Ok(details
            .pages
            .list
            .into_iter()
            .map(|page| MangaPage {
                id: generate_uid(chapter.source, page.id),
                source: chapter.source,
                url: page.img,
                referer: full_url.clone(),
            })
            .collect())
    }

    async fn get_tags(&self) -> Result<HashSet<MangaTag>> {
        let url = format!("https://{}/manga/", self.domain());
        let body = self.loader.get_text(&url).await?;

        parse_tags(&body, self.source())
    }
}
