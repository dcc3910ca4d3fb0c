use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header::CACHE_CONTROL, Request, StatusCode};
use freeplay::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;
use url::Url;

/// Answers by URL prefix and counts every outbound call.
struct Upstream {
    routes: Vec<(&'static str, u16, String)>,
    calls: AtomicUsize,
}

impl Upstream {
    fn new(routes: Vec<(&'static str, u16, String)>) -> Arc<Self> {
        Arc::new(Self { routes, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl Fetcher for Upstream {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hit = self.routes.iter().find(|(prefix, _, _)| url.as_str().starts_with(prefix));
        Ok(match hit {
            Some((_, status, body)) => FetchResponse::new(*status, body.clone()),
            None => FetchResponse::new(404, "not found"),
        })
    }
}

fn config() -> Config {
    let mut c = Config::default();
    c.upstream.freetogame = "https://f2g.test/api".into();
    c.upstream.github = "https://gh.test".into();
    c.upstream.fdroid_repo = "https://fdroid.test/repo".into();
    c.upstream.fdroid_site = "https://fdroid.test".into();
    c
}

fn app(upstream: Arc<Upstream>) -> axum::Router {
    router(Arc::new(AppState::new(upstream, &config()).unwrap()))
}

async fn call(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let cache = resp.headers().get(CACHE_CONTROL).map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, cache, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn games_survives_total_upstream_failure() {
    let upstream = Upstream::new(vec![
        ("https://f2g.test/", 500, "boom".into()),
        ("https://fdroid.test/", 503, "".into()),
        ("https://gh.test/", 403, "{\"message\": \"rate limited\"}".into()),
    ]);
    let (status, cache, body) = call(app(upstream.clone()), "/games").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("s-maxage=3600, stale-while-revalidate=86400"));
    assert_eq!(body, json!({ "success": true, "count": 0, "games": [] }));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn games_merges_sources_in_priority_order() {
    let upstream = Upstream::new(vec![
        (
            "https://f2g.test/api/games",
            200,
            json!([{ "id": 1, "title": "Krunker", "thumbnail": "k.jpg", "game_url": "https://f2g.test/open/krunker" }]).to_string(),
        ),
        (
            "https://gh.test/search/repositories",
            200,
            json!({ "items": [{ "id": 1, "name": "mindustry", "html_url": "https://github.com/Anuken/Mindustry", "owner": { "login": "Anuken", "avatar_url": "a.png" } }] }).to_string(),
        ),
    ]);
    let (status, _, body) = call(app(upstream), "/games").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["games"][0]["id"], "f2g-1");
    assert_eq!(body["games"][0]["source"], "FreeToGame");
    assert_eq!(body["games"][0]["primaryUrl"], "https://f2g.test/open/krunker");
    assert_eq!(body["games"][1]["id"], "gh-1");
    assert_eq!(body["games"][1]["imageUrl"], "a.png");
}

#[tokio::test]
async fn proxy_requires_url_before_any_network_call() {
    let upstream = Upstream::new(vec![]);
    let (status, cache, body) = call(app(upstream.clone()), "/proxy").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache, None);
    assert_eq!(body, json!({ "message": "Error: The \"url\" query parameter is required." }));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn proxy_rejects_repeated_url_with_envelope() {
    let upstream = Upstream::new(vec![]);
    let (status, _, body) = call(app(upstream.clone()), "/proxy?url=https%3A%2F%2Fa.test&url=https%3A%2F%2Fb.test").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Error: The \"url\" query parameter is required." }));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn proxy_forwards_upstream_status_with_synthesized_message() {
    let upstream = Upstream::new(vec![("https://down.test/", 503, "oops".into())]);
    let (status, cache, body) = call(app(upstream), "/proxy?url=https%3A%2F%2Fdown.test%2Fapi").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(cache, None);
    assert_eq!(body, json!({ "message": "Failed to fetch data from the source API. Status: 503" }));
}

#[tokio::test]
async fn proxy_passes_json_through() {
    let payload = json!([{ "id": 3, "title": "Giveaway", "worth": "$9.99" }]);
    let upstream = Upstream::new(vec![("https://gp.test/api/giveaways", 200, payload.to_string())]);
    let (status, cache, body) =
        call(app(upstream), "/proxy?url=https%3A%2F%2Fgp.test%2Fapi%2Fgiveaways%3Ftype%3Dgame").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("s-maxage=60, stale-while-revalidate=300"));
    assert_eq!(body, payload);
}
