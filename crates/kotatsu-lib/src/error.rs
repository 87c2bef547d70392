use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The site answered, but the payload did not have the expected shape
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server returned status {status} for {url}")]
    Http { status: u16, url: String },
    #[error(transparent)]
    Transport(anyhow::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Whether the error means "the response shape did not match expectations"
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert!(Error::parse("no response").is_parse());

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::from(json_err).is_parse());

        let http = Error::Http {
            status: 503,
            url: "https://desu.me/manga/api/".to_string(),
        };
        assert!(!http.is_parse());
        assert_eq!(
            http.to_string(),
            "server returned status 503 for https://desu.me/manga/api/"
        );
    }
}
