use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{endpoint, null_as_default, CatalogSource};
use crate::error::SourceError;
use crate::fetch::{fetch_json, Fetcher};
use crate::mapping::catalog_entry_from_repository;
use crate::types::{CatalogEntry, SourceTag};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
    #[serde(deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(deserialize_with = "null_as_default")]
    pub avatar_url: String,
}

/// A repository from `/search/repositories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryEntry {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: Owner,
    #[serde(deserialize_with = "null_as_default")]
    pub html_url: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub language: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub total_count: u64,
    pub incomplete_results: bool,
    pub items: Vec<RepositoryEntry>,
}

/// Parameters of a repository search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoQuery {
    pub q: String,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub per_page: u32,
}

impl RepoQuery {
    /// The catalog's fixed query: Android games ranked by stars.
    pub fn mobile_games(per_page: u32) -> Self {
        Self {
            q: "android game topic:game".to_string(),
            sort: Some("stars".to_string()),
            order: Some("desc".to_string()),
            per_page,
        }
    }

    /// Free-text search over repository names and descriptions.
    pub fn text(term: &str, per_page: u32) -> Self {
        Self { q: format!("{term} in:name,description"), sort: None, order: None, per_page }
    }
}

pub fn search_url(base: &Url, query: &RepoQuery) -> Url {
    let mut url = endpoint(base, "search/repositories");
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("q", &query.q);
        if let Some(sort) = &query.sort {
            q.append_pair("sort", sort);
        }
        if let Some(order) = &query.order {
            q.append_pair("order", order);
        }
        q.append_pair("per_page", &query.per_page.to_string());
    }
    url
}

pub struct GitHubSource {
    url: Url,
}

impl GitHubSource {
    pub fn new(base: &Url, per_page: u32) -> Self {
        Self { url: search_url(base, &RepoQuery::mobile_games(per_page)) }
    }
}

#[async_trait]
impl CatalogSource for GitHubSource {
    fn tag(&self) -> SourceTag {
        SourceTag::GitHub
    }

    async fn fetch_entries(&self, fetcher: &dyn Fetcher) -> Result<Vec<CatalogEntry>, SourceError> {
        let resp: SearchResponse = fetch_json(fetcher, &self.url).await?;
        Ok(resp.items.iter().map(catalog_entry_from_repository).collect())
    }
}
