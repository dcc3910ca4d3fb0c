//! Client-direct access to the providers, either straight or through a `/proxy` relay.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;
use url::Url;

use crate::config::{AccessMode, UpstreamConfig};
use crate::error::{DetailError, SetupError, SourceError};
use crate::fetch::{fetch_json, Access, Fetcher};
use crate::mapping::giveaway_entry_from;
use crate::search::SearchBackend;
use crate::sources::freetogame::{self, GameDetails, GameFilter, GameSummary};
use crate::sources::gamerpower::{self, Giveaway, GiveawayFilter};
use crate::sources::github::{self, RepoQuery, RepositoryEntry, SearchResponse};
use crate::sources::{parse, Endpoints};
use crate::types::GiveawayEntry;

pub struct CatalogClient {
    fetcher: Arc<dyn Fetcher>,
    access: Access,
    endpoints: Endpoints,
}

impl CatalogClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, access: Access, endpoints: Endpoints) -> Self {
        Self { fetcher, access, endpoints }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, cfg: &UpstreamConfig) -> Result<Self, SetupError> {
        let access = match &cfg.client_access {
            AccessMode::Direct => Access::Direct,
            AccessMode::ViaProxy { proxy_url } => Access::ViaProxy(parse("upstream.client_access.proxy_url", proxy_url)?),
        };
        Ok(Self::new(fetcher, access, Endpoints::from_config(cfg)?))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, target: &Url) -> Result<T, SourceError> {
        fetch_json(self.fetcher.as_ref(), &self.access.resolve(target)).await
    }

    pub async fn games(&self, filter: &GameFilter) -> Result<Vec<GameSummary>, SourceError> {
        self.get(&freetogame::games_url(&self.endpoints.freetogame, filter)).await
    }

    /// Failures here are meant for display, so they come back as [`DetailError`].
    pub async fn game_details(&self, id: u64) -> Result<GameDetails, DetailError> {
        self.get(&freetogame::game_url(&self.endpoints.freetogame, id)).await.map_err(|e| {
            error!("Failed to load details for game {id}: {e}");
            DetailError(e)
        })
    }

    pub async fn giveaways(&self, filter: &GiveawayFilter) -> Result<Vec<GiveawayEntry>, SourceError> {
        let raw: Vec<Giveaway> = self.get(&gamerpower::giveaways_url(&self.endpoints.gamerpower, filter)).await?;
        Ok(raw.iter().map(giveaway_entry_from).collect())
    }

    pub async fn search_repositories(&self, query: &RepoQuery) -> Result<Vec<RepositoryEntry>, SourceError> {
        let resp: SearchResponse = self.get(&github::search_url(&self.endpoints.github, query)).await?;
        Ok(resp.items)
    }
}

#[async_trait]
impl SearchBackend for CatalogClient {
    async fn catalog(&self) -> Result<Vec<GameSummary>, SourceError> {
        self.games(&GameFilter::default()).await
    }

    async fn repositories(&self, term: &str, limit: usize) -> Result<Vec<RepositoryEntry>, SourceError> {
        let per_page = limit.clamp(1, 100) as u32;
        self.search_repositories(&RepoQuery::text(term, per_page)).await
    }
}
