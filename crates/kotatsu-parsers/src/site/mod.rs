use kotatsu_lib::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::parse_json;

pub mod desume;
pub use desume::DesuMeRepository;

/// Extracts and decodes the top level `response` member most JSON APIs wrap their payload in
pub(crate) fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let mut json = parse_json(body)?;
    match json.get_mut("response").map(Value::take) {
        Some(Value::Null) | None => Err(Error::parse("Invalid response")),
        Some(response) => Ok(serde_json::from_value(response)?),
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::{collections::HashMap, sync::Mutex};

    use async_trait::async_trait;
    use kotatsu_lib::error::{Error, Result};

    use crate::context::HttpLoader;

    /// Serves canned bodies by url prefix and records every requested url
    #[derive(Default)]
    pub struct FakeLoader {
        responses: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeLoader {
        pub fn with(mut self, url_prefix: &str, body: &str) -> Self {
            self.responses
                .insert(url_prefix.to_string(), body.to_string());
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpLoader for FakeLoader {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .iter()
                .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, body)| body.clone())
                .ok_or_else(|| Error::Http {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }
}
