use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Transport-level failures from the outbound fetch layer.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { FetchError::Timeout(e) } else { FetchError::Network(e) }
    }
}

/// Failure of one call against one upstream provider.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("malformed upstream body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Network(#[from] FetchError),
}

/// Errors surfaced by the `/proxy` relay. The display text is the `message` of the
/// JSON envelope returned to the caller.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Error: The \"url\" query parameter is required.")]
    BadRequest,

    #[error("Failed to fetch data from the source API. Status: {status}")]
    Upstream { status: u16 },

    #[error("Internal Server Error in proxy: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> serde_json::Value {
        json!({ "message": self.to_string() })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

pub const DETAIL_ERROR_MESSAGE: &str =
    "Failed to load game details. The game may not be available or the API is down.";

/// Detail-view failure. Unlike search, this one is meant to be shown to the user.
#[derive(Error, Debug)]
#[error("Failed to load game details. The game may not be available or the API is down.")]
pub struct DetailError(#[source] pub SourceError);

/// Failures while wiring components from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_envelopes() {
        assert_eq!(
            ProxyError::Upstream { status: 503 }.envelope(),
            json!({ "message": "Failed to fetch data from the source API. Status: 503" })
        );
        assert_eq!(ProxyError::Upstream { status: 503 }.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ProxyError::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::Internal("boom".into()).to_string(),
            "Internal Server Error in proxy: boom"
        );
    }

    #[test]
    fn detail_error_carries_user_message() {
        let e = DetailError(SourceError::Upstream { status: 404 });
        assert_eq!(e.to_string(), DETAIL_ERROR_MESSAGE);
    }
}
