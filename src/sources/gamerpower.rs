use serde::{Deserialize, Serialize};
use url::Url;

use super::{endpoint, null_as_default};

/// A giveaway as served by GamerPower's `/giveaways`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Giveaway {
    pub id: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub worth: String,
    #[serde(deserialize_with = "null_as_default")]
    pub thumbnail: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub instructions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub open_giveaway_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub published_date: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub giveaway_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platforms: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_date: String,
    pub users: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gamerpower_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub open_giveaway: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiveawayFilter {
    pub giveaway_type: Option<String>,
    pub platform: Option<String>,
    pub sort_by: Option<String>,
}

impl GiveawayFilter {
    pub fn of_type(giveaway_type: &str) -> Self {
        Self { giveaway_type: Some(giveaway_type.to_string()), ..Default::default() }
    }
}

pub fn giveaways_url(base: &Url, filter: &GiveawayFilter) -> Url {
    let mut url = endpoint(base, "giveaways");
    {
        let mut q = url.query_pairs_mut();
        for (key, value) in [
            ("type", &filter.giveaway_type),
            ("platform", &filter.platform),
            ("sort-by", &filter.sort_by),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                q.append_pair(key, v);
            }
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}
