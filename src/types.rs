use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sources::freetogame::GameSummary;
use crate::sources::github::RepositoryEntry;

/// Upstream providers contributing to the aggregated catalog, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "FreeToGame")]
    FreeToGame,
    #[serde(rename = "F-Droid")]
    FDroid,
    #[serde(rename = "GitHub")]
    GitHub,
}

impl SourceTag {
    /// Prefix that keeps ids unique across providers sharing numeric ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SourceTag::FreeToGame => "f2g",
            SourceTag::FDroid => "fdroid",
            SourceTag::GitHub => "gh",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceTag::FreeToGame => "FreeToGame",
            SourceTag::FDroid => "F-Droid",
            SourceTag::GitHub => "GitHub",
        }
    }

    pub fn entry_id(&self, provider_id: impl std::fmt::Display) -> String {
        format!("{}-{}", self.id_prefix(), provider_id)
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apk: Option<String>,
}

impl AlternateUrls {
    /// Preferred outbound link: play, then store, then apk.
    pub fn primary(&self) -> Option<String> {
        self.play.clone().or_else(|| self.store.clone()).or_else(|| self.apk.clone())
    }
}

/// One game in the aggregated catalog, normalized from any provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub primary_url: Option<String>,
    pub alternate_urls: AlternateUrls,
    pub source: SourceTag,
    pub platforms: BTreeSet<String>,
}

/// A giveaway promotion, normalized from GamerPower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiveawayEntry {
    pub id: u64,
    pub title: String,
    pub worth: Option<String>,
    pub image_url: Option<String>,
    pub description: String,
    pub instructions: Option<String>,
    pub platforms: Vec<String>,
    pub giveaway_type: Option<String>,
    pub end_date: Option<String>,
    pub claim_url: Option<String>,
    pub status: String,
    pub users: u64,
}

/// Body of a successful `/games` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesResponse {
    pub success: bool,
    pub count: usize,
    pub games: Vec<CatalogEntry>,
}

impl GamesResponse {
    pub fn new(games: Vec<CatalogEntry>) -> Self {
        Self { success: true, count: games.len(), games }
    }
}

/// Body of a failed `/games` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesFailure {
    pub success: bool,
    pub error: String,
    pub details: String,
}

/// One row of the merged search panel. The discriminant tells the host whether the
/// row navigates in-app (`primary`) or opens an outbound link (`external`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resultType", rename_all = "lowercase")]
pub enum SearchResult {
    Primary(GameSummary),
    External(RepositoryEntry),
}

impl SearchResult {
    pub fn title(&self) -> &str {
        match self {
            SearchResult::Primary(g) => &g.title,
            SearchResult::External(r) => &r.name,
        }
    }

    /// Secondary line shown under the title.
    pub fn subtitle(&self) -> &str {
        match self {
            SearchResult::Primary(g) => &g.platform,
            SearchResult::External(_) => "Mobile (GitHub)",
        }
    }

    /// Stable key for rendering lists; ids of the two variants may collide.
    pub fn key(&self) -> String {
        match self {
            SearchResult::Primary(g) => format!("primary-{}", g.id),
            SearchResult::External(r) => format!("external-{}", r.id),
        }
    }
}
