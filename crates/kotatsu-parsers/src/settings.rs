use serde::{Deserialize, Serialize};

use crate::proxy::is_valid_host;

pub const KEY_DOMAIN: &str = "domain";

/// User overrides for a single source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub domain: Option<String>,
}

impl SourceSettings {
    /// Returns the overridden domain when it is a valid host, `default` otherwise
    pub fn domain_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if is_valid_host(domain) => domain,
            Some(domain) if !domain.is_empty() => {
                warn!("ignoring invalid domain override {domain:?}, using {default}");
                default
            }
            _ => default,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_domain_or() {
        let settings = SourceSettings::default();
        assert_eq!(settings.domain_or("desu.me"), "desu.me");

        let settings = SourceSettings {
            domain: Some(" desu.win ".to_string()),
        };
        assert_eq!(settings.domain_or("desu.me"), "desu.win");

        let settings = SourceSettings {
            domain: Some("https://desu.win/".to_string()),
        };
        assert_eq!(settings.domain_or("desu.me"), "desu.me");
    }
}
