use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::SourceCaps;
use crate::fetch::Fetcher;
use crate::sources::fdroid::FDroidSource;
use crate::sources::freetogame::FreeToGameSource;
use crate::sources::github::GitHubSource;
use crate::sources::{CatalogSource, Endpoints};
use crate::types::CatalogEntry;

struct Slot {
    source: Arc<dyn CatalogSource>,
    cap: Option<usize>,
}

/// Fans out to every catalog source and merges the survivors in priority order.
pub struct Aggregator {
    fetcher: Arc<dyn Fetcher>,
    slots: Vec<Slot>,
}

impl Aggregator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher, slots: Vec::new() }
    }

    /// The three production sources, in priority order.
    pub fn from_endpoints(
        fetcher: Arc<dyn Fetcher>,
        endpoints: &Endpoints,
        caps: &SourceCaps,
    ) -> Self {
        let github_page = caps.github.map(|c| c.clamp(1, 100) as u32).unwrap_or(30);
        Self::new(fetcher)
            .with_source(Arc::new(FreeToGameSource::new(&endpoints.freetogame)), caps.freetogame)
            .with_source(
                Arc::new(FDroidSource::new(
                    &endpoints.fdroid_repo,
                    &endpoints.fdroid_site,
                    &endpoints.fdroid_category,
                )),
                caps.fdroid,
            )
            .with_source(Arc::new(GitHubSource::new(&endpoints.github, github_page)), caps.github)
    }

    /// Append a source after those already registered.
    pub fn with_source(mut self, source: Arc<dyn CatalogSource>, cap: Option<usize>) -> Self {
        self.slots.push(Slot { source, cap });
        self
    }

    /// Query every source concurrently. A failing source is logged and contributes
    /// nothing; it never aborts its siblings.
    pub async fn list_games(&self) -> Vec<CatalogEntry> {
        let calls = self.slots.iter().map(|slot| {
            let source = slot.source.clone();
            let fetcher = self.fetcher.clone();
            // each source runs in its own task so a panicking adapter is contained too
            tokio::spawn(async move { source.fetch_entries(fetcher.as_ref()).await })
        });
        let outcomes = join_all(calls).await;

        let mut seen = HashSet::new();
        let mut games = Vec::new();
        for (slot, outcome) in self.slots.iter().zip(outcomes) {
            let tag = slot.source.tag();
            let entries = match outcome {
                Ok(Ok(entries)) => entries,
                Ok(Err(e)) => {
                    warn!("Failed to fetch from {tag}: {e}");
                    continue;
                }
                Err(e) => {
                    warn!("Fetch task for {tag} did not complete: {e}");
                    continue;
                }
            };
            let cap = slot.cap.unwrap_or(usize::MAX);
            let before = games.len();
            games.extend(entries.into_iter().filter(|e| seen.insert(e.id.clone())).take(cap));
            info!("{tag} contributed {} entries", games.len() - before);
        }
        games
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::error::FetchError;
    use crate::fetch::mock::{unresponsive_endpoint, MockFetcher};
    use crate::fetch::{FetchResponse, HttpFetcher};
    use crate::types::SourceTag;
    use async_trait::async_trait;
    use std::time::Duration;
    use url::Url;
    use serde_json::json;

    fn endpoints() -> Endpoints {
        Endpoints::from_config(&UpstreamConfig {
            freetogame: "https://f2g.test/api".into(),
            github: "https://gh.test".into(),
            fdroid_repo: "https://fdroid.test/repo".into(),
            fdroid_site: "https://fdroid.test".into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn f2g_games(n: u64) -> serde_json::Value {
        json!((1..=n).map(|i| json!({"id": i, "title": format!("Game {i}"), "game_url": format!("https://f2g.test/open/{i}")})).collect::<Vec<_>>())
    }

    fn fdroid_index(n: usize) -> serde_json::Value {
        let apps: Vec<_> = (0..n).map(|i| json!({"packageName": format!("pkg{i}"), "name": format!("App {i}"), "categories": ["Games"]})).collect();
        let packages: serde_json::Map<String, serde_json::Value> =
            (0..n).map(|i| (format!("pkg{i}"), json!([{"apkName": format!("pkg{i}.apk")}]))).collect();
        json!({ "apps": apps, "packages": packages })
    }

    fn gh_repos(n: u64) -> serde_json::Value {
        // numeric ids deliberately overlap FreeToGame's
        json!({ "total_count": n, "items": (1..=n).map(|i| json!({"id": i, "name": format!("repo{i}"), "html_url": format!("https://github.com/x/repo{i}")})).collect::<Vec<_>>() })
    }

    #[tokio::test]
    async fn every_source_failing_yields_an_empty_list() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .reply("https://f2g.test/", 503, "oops")
                .fail("https://fdroid.test/")
                .reply("https://gh.test/", 200, "{not json"),
        );
        let agg = Aggregator::from_endpoints(fetcher.clone(), &endpoints(), &SourceCaps::default());
        assert!(agg.list_games().await.is_empty());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn caps_order_and_unique_ids() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .json("https://f2g.test/", f2g_games(50))
                .json("https://fdroid.test/", fdroid_index(30))
                .json("https://gh.test/", gh_repos(15)),
        );
        let agg = Aggregator::from_endpoints(fetcher, &endpoints(), &SourceCaps::default());
        let games = agg.list_games().await;

        let count = |tag| games.iter().filter(|g| g.source == tag).count();
        assert_eq!(count(SourceTag::FreeToGame), 20);
        assert_eq!(count(SourceTag::FDroid), 20);
        assert_eq!(count(SourceTag::GitHub), 10);

        let order: Vec<SourceTag> = games.iter().map(|g| g.source).collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|t| match t {
            SourceTag::FreeToGame => 0,
            SourceTag::FDroid => 1,
            SourceTag::GitHub => 2,
        });
        assert_eq!(order, sorted);

        let ids: HashSet<_> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids.len(), games.len());
        assert_eq!(games[0].id, "f2g-1");
        assert_eq!(games[40].id, "gh-1");
    }

    #[tokio::test]
    async fn one_failure_leaves_siblings_intact() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .json("https://f2g.test/", f2g_games(3))
                .reply("https://fdroid.test/", 500, "down")
                .json("https://gh.test/", gh_repos(2)),
        );
        let agg = Aggregator::from_endpoints(fetcher, &endpoints(), &SourceCaps::default());
        let ids: Vec<String> = agg.list_games().await.into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["f2g-1", "f2g-2", "f2g-3", "gh-1", "gh-2"]);
    }

    #[tokio::test]
    async fn duplicate_provider_ids_keep_the_first() {
        let dupes = json!([
            {"id": 7, "title": "First"},
            {"id": 7, "title": "Second"}
        ]);
        let fetcher = Arc::new(MockFetcher::new().json("https://f2g.test/", dupes));
        let caps = SourceCaps { freetogame: None, fdroid: None, github: None };
        let agg = Aggregator::from_endpoints(fetcher, &endpoints(), &caps);
        let games = agg.list_games().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].title, "First");
    }

    #[tokio::test]
    async fn duplicates_do_not_count_against_the_cap() {
        let rows = json!([{"id": 7}, {"id": 7}, {"id": 8}, {"id": 9}]);
        let fetcher = Arc::new(MockFetcher::new().json("https://f2g.test/", rows));
        let caps = SourceCaps { freetogame: Some(2), fdroid: None, github: None };
        let agg = Aggregator::from_endpoints(fetcher, &endpoints(), &caps);
        let ids: Vec<String> = agg.list_games().await.into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["f2g-7", "f2g-8"]);
    }

    #[tokio::test]
    async fn null_optional_fields_keep_the_record() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .json(
                    "https://f2g.test/",
                    json!([
                        {"id": 1, "title": "Krunker", "thumbnail": "t.jpg", "game_url": "https://f2g.test/open/1"},
                        {"id": 2, "title": "Shell Shockers", "thumbnail": null, "game_url": null, "short_description": null}
                    ]),
                )
                .json(
                    "https://gh.test/",
                    json!({ "items": [
                        {"id": 5, "name": "openttd", "html_url": null, "owner": {"login": "x", "avatar_url": null}},
                        {"id": 6, "name": "supertux", "owner": null, "topics": null}
                    ]}),
                ),
        );
        let agg = Aggregator::from_endpoints(fetcher, &endpoints(), &SourceCaps::default());
        let games = agg.list_games().await;

        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["f2g-1", "f2g-2", "gh-5", "gh-6"]);
        assert_eq!(games[0].image_url.as_deref(), Some("t.jpg"));
        assert_eq!(games[1].image_url, None);
        assert_eq!(games[1].primary_url, None);
        assert_eq!(games[1].description, "");
        assert_eq!(games[2].image_url, None);
        assert_eq!(games[2].primary_url, None);
        assert_eq!(games[3].image_url, None);
    }

    /// Loopback calls go over a real socket with a short timeout; everything else is scripted.
    struct LoopbackOrScripted {
        http: HttpFetcher,
        scripted: MockFetcher,
    }

    #[async_trait]
    impl Fetcher for LoopbackOrScripted {
        async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
            if url.host_str() == Some("127.0.0.1") {
                self.http.get(url).await
            } else {
                self.scripted.get(url).await
            }
        }
    }

    #[tokio::test]
    async fn timed_out_source_leaves_siblings_intact() {
        let silent = unresponsive_endpoint().await;
        let endpoints = Endpoints::from_config(&UpstreamConfig {
            freetogame: format!("{silent}api"),
            github: "https://gh.test".into(),
            fdroid_repo: "https://fdroid.test/repo".into(),
            fdroid_site: "https://fdroid.test".into(),
            ..Default::default()
        })
        .unwrap();
        let fetcher = Arc::new(LoopbackOrScripted {
            http: HttpFetcher::new(Duration::from_millis(50)).unwrap(),
            scripted: MockFetcher::new()
                .json("https://fdroid.test/", fdroid_index(2))
                .json("https://gh.test/", gh_repos(2)),
        });

        let agg = Aggregator::from_endpoints(fetcher, &endpoints, &SourceCaps::default());
        let ids: Vec<String> = agg.list_games().await.into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["fdroid-pkg0", "fdroid-pkg1", "gh-1", "gh-2"]);
    }
}
