use std::net::{IpAddr, Ipv6Addr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy address is required")]
    MissingAddress,
    #[error("invalid proxy address: {0}")]
    InvalidAddress(String),
    #[error("proxy port is required")]
    MissingPort,
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Direct,
    Http,
    Socks,
}

/// Global proxy used by the transport. Address and port are ignored for `direct`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyConfig {
    #[serde(default, rename = "type")]
    pub kind: ProxyType,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ProxyConfig {
    pub fn is_enabled(&self) -> bool {
        self.kind != ProxyType::Direct
    }

    pub fn validate(&self) -> Result<(), ProxyError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .ok_or(ProxyError::MissingAddress)?;
        if !is_valid_host(address) {
            return Err(ProxyError::InvalidAddress(address.to_string()));
        }

        match self.port {
            None | Some(0) => Err(ProxyError::MissingPort),
            Some(_) => Ok(()),
        }
    }

    pub fn to_reqwest(&self) -> Result<Option<reqwest::Proxy>, ProxyError> {
        self.validate()?;

        let scheme = match self.kind {
            ProxyType::Direct => return Ok(None),
            ProxyType::Http => "http",
            ProxyType::Socks => "socks5",
        };
        let url = format!(
            "{scheme}://{}:{}",
            url_host(self.address.as_deref().unwrap_or_default().trim()),
            self.port.unwrap_or_default()
        );

        Ok(Some(reqwest::Proxy::all(url)?))
    }
}

/// Host part of an authority, IPv6 literals must be bracketed
fn url_host(address: &str) -> String {
    if address.parse::<Ipv6Addr>().is_ok() {
        format!("[{address}]")
    } else {
        address.to_string()
    }
}

/// Accepts IP literals and DNS host names
pub fn is_valid_host(value: &str) -> bool {
    if value.parse::<IpAddr>().is_ok() {
        return true;
    }
    if value.is_empty() || value.len() > 253 {
        return false;
    }

    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
