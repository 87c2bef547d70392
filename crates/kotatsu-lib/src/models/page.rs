use serde::{Deserialize, Serialize};

use super::MangaSource;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MangaPage {
    pub id: i64,
    pub source: MangaSource,
    pub url: String,
    /// Sent as `Referer` when the image itself is fetched
    pub referer: String,
}
