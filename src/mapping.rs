use std::collections::BTreeSet;

use url::Url;

use crate::sources::endpoint;
use crate::sources::fdroid::{App, Build};
use crate::sources::freetogame::GameSummary;
use crate::sources::gamerpower::Giveaway;
use crate::sources::github::RepositoryEntry;
use crate::types::{AlternateUrls, CatalogEntry, GiveawayEntry, SourceTag};

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("N/A") { None } else { Some(t.to_string()) }
}

fn platforms(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|p| p.to_string()).collect()
}

fn entry(
    source: SourceTag,
    provider_id: impl std::fmt::Display,
    title: String,
    description: String,
    image_url: Option<String>,
    alternate_urls: AlternateUrls,
    platforms: BTreeSet<String>,
) -> CatalogEntry {
    CatalogEntry {
        id: source.entry_id(provider_id),
        title,
        description,
        image_url,
        primary_url: alternate_urls.primary(),
        alternate_urls,
        source,
        platforms,
    }
}

pub fn catalog_entry_from_game(g: &GameSummary) -> CatalogEntry {
    let url = non_empty(&g.game_url);
    entry(
        SourceTag::FreeToGame,
        g.id,
        g.title.clone(),
        g.short_description.clone(),
        non_empty(&g.thumbnail),
        AlternateUrls { play: url.clone(), store: url, apk: None },
        platforms(&["web"]),
    )
}

/// Where F-Droid serves icons/APKs (`repo`) and package pages (`site`).
#[derive(Debug, Clone)]
pub struct FDroidLinks {
    pub repo: Url,
    pub site: Url,
}

pub fn catalog_entry_from_app(links: &FDroidLinks, app: &App, build: &Build) -> CatalogEntry {
    let pkg = &app.package_name;
    let apk = non_empty(&build.apk_name).map(|name| endpoint(&links.repo, &name).to_string());
    let mut store = endpoint(&links.site, &format!("packages/{pkg}"));
    // package pages are served with a trailing slash
    if let Ok(mut segments) = store.path_segments_mut() {
        segments.push("");
    }
    entry(
        SourceTag::FDroid,
        pkg,
        app.name.as_deref().and_then(non_empty).unwrap_or_else(|| pkg.clone()),
        app.summary.as_deref().and_then(non_empty).unwrap_or_default(),
        Some(endpoint(&links.repo, &format!("icons-640/{pkg}.png")).to_string()),
        AlternateUrls { play: None, store: Some(store.to_string()), apk },
        platforms(&["android"]),
    )
}

pub fn catalog_entry_from_repository(r: &RepositoryEntry) -> CatalogEntry {
    entry(
        SourceTag::GitHub,
        r.id,
        r.name.clone(),
        r.description.as_deref().and_then(non_empty).unwrap_or_default(),
        non_empty(&r.owner.avatar_url),
        AlternateUrls { play: None, store: non_empty(&r.html_url), apk: None },
        platforms(&["android", "ios", "source"]),
    )
}

pub fn giveaway_entry_from(g: &Giveaway) -> GiveawayEntry {
    GiveawayEntry {
        id: g.id,
        title: g.title.clone(),
        worth: non_empty(&g.worth),
        image_url: non_empty(&g.image).or_else(|| non_empty(&g.thumbnail)),
        description: g.description.clone(),
        instructions: non_empty(&g.instructions),
        platforms: g.platforms.split(',').filter_map(non_empty).collect(),
        giveaway_type: non_empty(&g.giveaway_type),
        end_date: non_empty(&g.end_date),
        claim_url: non_empty(&g.open_giveaway_url).or_else(|| non_empty(&g.open_giveaway)),
        status: g.status.clone(),
        users: g.users,
    }
}
