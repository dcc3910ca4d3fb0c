use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{endpoint, null_as_default, CatalogSource};
use crate::error::SourceError;
use crate::fetch::{fetch_json, Fetcher};
use crate::mapping::catalog_entry_from_game;
use crate::types::{CatalogEntry, SourceTag};

/// A game as listed by FreeToGame's `/games` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSummary {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub thumbnail: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub game_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub genre: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(deserialize_with = "null_as_default")]
    pub publisher: String,
    #[serde(deserialize_with = "null_as_default")]
    pub developer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub freetogame_profile_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemRequirements {
    #[serde(deserialize_with = "null_as_default")]
    pub os: String,
    #[serde(deserialize_with = "null_as_default")]
    pub processor: String,
    #[serde(deserialize_with = "null_as_default")]
    pub memory: String,
    #[serde(deserialize_with = "null_as_default")]
    pub graphics: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Screenshot {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
}

/// `/game?id=` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetails {
    #[serde(flatten)]
    pub summary: GameSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub minimum_system_requirements: Option<SystemRequirements>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
}

/// Listing filters understood by FreeToGame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    pub platform: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
}

impl GameFilter {
    pub fn sorted_by(sort_by: &str) -> Self {
        Self { sort_by: Some(sort_by.to_string()), ..Default::default() }
    }
}

pub fn games_url(base: &Url, filter: &GameFilter) -> Url {
    let mut url = endpoint(base, "games");
    {
        let mut q = url.query_pairs_mut();
        if let Some(platform) = filter.platform.as_deref().filter(|p| !p.is_empty() && *p != "all") {
            q.append_pair("platform", platform);
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            q.append_pair("category", category);
        }
        if let Some(sort_by) = filter.sort_by.as_deref().filter(|s| !s.is_empty()) {
            q.append_pair("sort-by", sort_by);
        }
    }
    // no filters: drop the dangling `?`
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}

pub fn game_url(base: &Url, id: u64) -> Url {
    let mut url = endpoint(base, "game");
    url.query_pairs_mut().append_pair("id", &id.to_string());
    url
}

/// Browser games, most popular first.
pub struct FreeToGameSource {
    url: Url,
}

impl FreeToGameSource {
    pub fn new(base: &Url) -> Self {
        let filter = GameFilter {
            platform: Some("browser".to_string()),
            sort_by: Some("popularity".to_string()),
            ..Default::default()
        };
        Self { url: games_url(base, &filter) }
    }
}

#[async_trait]
impl CatalogSource for FreeToGameSource {
    fn tag(&self) -> SourceTag {
        SourceTag::FreeToGame
    }

    async fn fetch_entries(&self, fetcher: &dyn Fetcher) -> Result<Vec<CatalogEntry>, SourceError> {
        let games: Vec<GameSummary> = fetch_json(fetcher, &self.url).await?;
        Ok(games.iter().map(catalog_entry_from_game).collect())
    }
}
