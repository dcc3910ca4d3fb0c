//! Upstream provider adapters. Each submodule owns its provider's JSON shapes and URL
//! building; the pure shape-to-record mappings live in [`crate::mapping`].

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{SetupError, SourceError};
use crate::fetch::Fetcher;
use crate::types::{CatalogEntry, SourceTag};

pub mod fdroid;
pub mod freetogame;
pub mod gamerpower;
pub mod github;

/// One provider feeding the aggregated catalog. A call performs exactly one fetch and
/// never retries; retry policy, if any, belongs to the caller.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    async fn fetch_entries(&self, fetcher: &dyn Fetcher) -> Result<Vec<CatalogEntry>, SourceError>;
}

/// Parsed provider base URLs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub freetogame: Url,
    pub gamerpower: Url,
    pub github: Url,
    pub fdroid_repo: Url,
    pub fdroid_site: Url,
    pub fdroid_category: String,
}

impl Endpoints {
    pub fn from_config(cfg: &UpstreamConfig) -> Result<Self, SetupError> {
        Ok(Self {
            freetogame: parse("upstream.freetogame", &cfg.freetogame)?,
            gamerpower: parse("upstream.gamerpower", &cfg.gamerpower)?,
            github: parse("upstream.github", &cfg.github)?,
            fdroid_repo: parse("upstream.fdroid_repo", &cfg.fdroid_repo)?,
            fdroid_site: parse("upstream.fdroid_site", &cfg.fdroid_site)?,
            fdroid_category: cfg.fdroid_category.clone(),
        })
    }
}

pub(crate) fn parse(field: &'static str, raw: &str) -> Result<Url, SetupError> {
    Url::parse(raw).map_err(|source| SetupError::InvalidUrl { field, source })
}

/// Append path segments to a base URL, keeping whatever path the base already has.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(path.split('/').filter(|s| !s.is_empty()));
    }
    url
}

/// Providers send `null` for fields they have no value for; read it as the default.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
