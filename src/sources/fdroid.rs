use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{endpoint, null_as_default, CatalogSource};
use crate::error::SourceError;
use crate::fetch::{fetch_json, Fetcher};
use crate::mapping::{catalog_entry_from_app, FDroidLinks};
use crate::types::{CatalogEntry, SourceTag};

/// The bulk `index-v1.json` manifest. Only the fields used here are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Index {
    pub apps: Vec<App>,
    pub packages: HashMap<String, Vec<Build>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct App {
    #[serde(deserialize_with = "null_as_default")]
    pub package_name: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Build {
    #[serde(deserialize_with = "null_as_default")]
    pub apk_name: String,
    pub version_name: Option<String>,
    pub version_code: Option<u64>,
}

impl Index {
    /// Apps carrying `category`, in manifest order, each with its newest build if any.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = (&'a App, Option<&'a Build>)> + 'a {
        self.apps
            .iter()
            .filter(move |app| app.categories.iter().any(|c| c == category))
            .map(move |app| (app, self.packages.get(&app.package_name).and_then(|builds| builds.first())))
    }
}

/// Open-source Android games from the F-Droid main repository.
pub struct FDroidSource {
    index_url: Url,
    links: FDroidLinks,
    category: String,
}

impl FDroidSource {
    pub fn new(repo: &Url, site: &Url, category: &str) -> Self {
        Self {
            index_url: endpoint(repo, "index-v1.json"),
            links: FDroidLinks { repo: repo.clone(), site: site.clone() },
            category: category.to_string(),
        }
    }
}

#[async_trait]
impl CatalogSource for FDroidSource {
    fn tag(&self) -> SourceTag {
        SourceTag::FDroid
    }

    async fn fetch_entries(&self, fetcher: &dyn Fetcher) -> Result<Vec<CatalogEntry>, SourceError> {
        let index: Index = fetch_json(fetcher, &self.index_url).await?;
        Ok(index
            .in_category(&self.category)
            .filter_map(|(app, build)| Some(catalog_entry_from_app(&self.links, app, build?)))
            .collect())
    }
}
