use std::time::Duration;

use async_trait::async_trait;
use kotatsu_lib::error::{Error, Result};
use scraper::Html;
use serde_json::Value;

use crate::proxy::ProxyConfig;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.150 Safari/537.36 Edg/88.0.705.63";

/// Network seam used by site adapters
#[async_trait]
pub trait HttpLoader: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct MangaLoaderContext {
    client: reqwest::Client,
}

impl MangaLoaderContext {
    pub fn new(proxy: &ProxyConfig, connect_timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .cookie_store(true)
            .brotli(true)
            .deflate(true)
            .gzip(true)
            .connect_timeout(connect_timeout);

        if let Some(p) = proxy
            .to_reqwest()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?
        {
            info!("using {:?} proxy", proxy.kind);
            builder = builder.proxy(p);
        }

        let client = builder.build().map_err(|e| Error::Transport(e.into()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpLoader for MangaLoaderContext {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {url}");

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.into()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        res.text().await.map_err(|e| Error::Transport(e.into()))
    }
}

pub fn parse_json(body: &str) -> Result<Value> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_html(body: &str) -> Html {
    Html::parse_document(body)
}
