use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CACHE_CONTROL, header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::config::{CachePolicy, Config};
use crate::error::{ProxyError, SetupError};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::proxy::Gateway;
use crate::sources::Endpoints;
use crate::types::{GamesFailure, GamesResponse};

pub struct AppState {
    pub aggregator: Aggregator,
    pub gateway: Gateway,
    pub games_cache: CachePolicy,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Result<Self, SetupError> {
        let endpoints = Endpoints::from_config(&config.upstream)?;
        Ok(Self {
            aggregator: Aggregator::from_endpoints(fetcher.clone(), &endpoints, &config.aggregation),
            gateway: Gateway::new(fetcher, config.cache.proxy),
            games_cache: config.cache.games,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let fetcher = Arc::new(HttpFetcher::new(config.upstream.timeout())?);
        Self::new(fetcher, config)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/games", get(games_handler))
        .route("/proxy", get(proxy_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn games_handler(State(state): State<Arc<AppState>>) -> Response {
    let games = state.aggregator.list_games().await;
    info!("Serving {} aggregated games", games.len());

    match serde_json::to_value(GamesResponse::new(games)) {
        Ok(body) => {
            let mut resp = (StatusCode::OK, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&state.games_cache.header_value()) {
                resp.headers_mut().insert(CACHE_CONTROL, value);
            }
            resp
        }
        Err(e) => {
            error!("Failed to build games response: {e}");
            let body = GamesFailure {
                success: false,
                error: "Failed to fetch games".to_string(),
                details: e.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    url: Option<String>,
}

pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ProxyParams>, QueryRejection>,
) -> Response {
    // a malformed or repeated `url` gets the same envelope as a missing one
    let Ok(Query(params)) = params else {
        return ProxyError::BadRequest.into_response();
    };
    match state.gateway.relay(params.url.as_deref()).await {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing state...");
    let state = Arc::new(AppState::from_config(&config)?);

    let address = config.server.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
