use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::config::HttpConfig;
use crate::error::SourceError;

const SNIPPET_CHARS: usize = 220;

/// Every request made through this client carries the configured timeout.
pub fn build_client(cfg: &HttpConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let ua = HeaderValue::from_str(&cfg.user_agent).context("invalid user agent")?;
    headers.insert(USER_AGENT, ua);
    Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .default_headers(headers)
        .build()
        .context("failed to build http client")
}

pub fn fetch_text(client: &Client, url: &str) -> Result<String, SourceError> {
    let resp = client.get(url).send()?;
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            snippet: snippet(&body),
        });
    }
    if body.trim().is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(body)
}

fn snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}
