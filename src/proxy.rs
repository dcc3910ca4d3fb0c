use std::sync::Arc;

use axum::{
    http::{header::CACHE_CONTROL, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};
use url::Url;

use crate::config::CachePolicy;
use crate::error::ProxyError;
use crate::fetch::Fetcher;

/// Successful relay: the upstream JSON, untouched, plus the edge-cache directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
    pub cache_control: String,
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let mut resp = (self.status, Json(self.body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&self.cache_control) {
            resp.headers_mut().insert(CACHE_CONTROL, value);
        }
        resp
    }
}

/// Same-origin relay for client-originated upstream calls.
pub struct Gateway {
    fetcher: Arc<dyn Fetcher>,
    cache: CachePolicy,
}

impl Gateway {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: CachePolicy) -> Self {
        Self { fetcher, cache }
    }

    /// Forward one GET to `target`. A missing target fails before any network call;
    /// upstream failures keep their status but get a synthesized message.
    pub async fn relay(&self, target: Option<&str>) -> Result<ProxyReply, ProxyError> {
        let target = target.map(str::trim).filter(|t| !t.is_empty()).ok_or(ProxyError::BadRequest)?;
        let url = Url::parse(target).map_err(|e| {
            error!("Proxy rejected target {target:?}: {e}");
            ProxyError::Internal(format!("Invalid URL: {e}"))
        })?;

        let resp = self.fetcher.get(&url).await.map_err(|e| {
            error!("Proxy internal error fetching {url}: {e}");
            ProxyError::Internal(e.to_string())
        })?;

        if !resp.is_success() {
            warn!("Error from target API ({url}): {}", resp.text());
            return Err(ProxyError::Upstream { status: resp.status });
        }

        let body = resp.json().map_err(|e| {
            error!("Proxy could not parse body from {url}: {e}");
            ProxyError::Internal(e.to_string())
        })?;

        Ok(ProxyReply { status: StatusCode::OK, body, cache_control: self.cache.header_value() })
    }
}
