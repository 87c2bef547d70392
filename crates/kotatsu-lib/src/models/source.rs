use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifies which site adapter produced an entity.
///
/// Follow-up requests (details, pages) are routed back to the adapter by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MangaSource {
    Local,
    #[serde(rename = "DESUME")]
    DesuMe,
}

impl MangaSource {
    pub const ALL: &'static [MangaSource] = &[MangaSource::Local, MangaSource::DesuMe];

    /// Key used in persisted rows and configuration
    pub fn key(&self) -> &'static str {
        match self {
            MangaSource::Local => "LOCAL",
            MangaSource::DesuMe => "DESUME",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MangaSource::Local => "Local",
            MangaSource::DesuMe => "Desu.me",
        }
    }
}

impl fmt::Display for MangaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for MangaSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MangaSource::ALL
            .iter()
            .find(|source| source.key().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown source {s}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_source_from_key() {
        assert_eq!("DESUME".parse::<MangaSource>().unwrap(), MangaSource::DesuMe);
        assert_eq!("desume".parse::<MangaSource>().unwrap(), MangaSource::DesuMe);
        assert!("mangadex".parse::<MangaSource>().is_err());
    }

    #[test]
    fn test_source_serde_uses_key() {
        let json = serde_json::to_string(&MangaSource::DesuMe).unwrap();
        assert_eq!(json, "\"DESUME\"");
        for source in MangaSource::ALL {
            let json = serde_json::to_string(source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.key()));
        }
    }
}
