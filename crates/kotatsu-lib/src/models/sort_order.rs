use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Updated,
    Popularity,
    Rating,
    Newest,
    Alphabetical,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "updated" => Ok(SortOrder::Updated),
            "popularity" | "popular" => Ok(SortOrder::Popularity),
            "rating" => Ok(SortOrder::Rating),
            "newest" => Ok(SortOrder::Newest),
            "alphabetical" | "name" => Ok(SortOrder::Alphabetical),
            _ => Err(Error::InvalidArgument(format!("unknown sort order {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MangaState {
    Ongoing,
    Finished,
}
