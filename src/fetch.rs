//! Outbound HTTP. Every upstream call in the crate goes through a [`Fetcher`], which
//! keeps the network seam in one place and lets tests count or script calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, SourceError};

/// Status and raw body of an upstream response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a single GET. Non-success statuses are returned, not turned into errors.
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed fetcher with a per-call timeout.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            // GitHub rejects requests without a user agent
            .user_agent(concat!("freeplay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        debug!("GET {url}");
        let resp = self
            .http
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

/// How a caller reaches an upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Direct,
    /// Relay through a `/proxy` endpoint as `<proxy>?url=<encoded target>`.
    ViaProxy(Url),
}

impl Access {
    pub fn resolve(&self, target: &Url) -> Url {
        match self {
            Access::Direct => target.clone(),
            Access::ViaProxy(proxy) => {
                let mut url = proxy.clone();
                url.query_pairs_mut().append_pair("url", target.as_str());
                url
            }
        }
    }
}

/// GET `url` and decode a JSON body, mapping non-success statuses to [`SourceError::Upstream`].
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    url: &Url,
) -> Result<T, SourceError> {
    let resp = fetcher.get(url).await?;
    if !resp.is_success() {
        return Err(SourceError::Upstream { status: resp.status });
    }
    Ok(resp.json()?)
}
