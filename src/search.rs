//! Incremental search across the game catalog and repository search.
//!
//! Every input change bumps a generation counter and aborts the pending task. A task
//! only writes to the view while its generation is still current, so a superseded
//! query can never leak results into the panel, even if an abort races a completion.
//!
//! ```text
//! Idle ──input──▶ Debouncing ──window elapsed──▶ Querying ──▶ Displaying | Empty | Error
//!  ▲                  │ (< min length)
//!  └──────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::sources::freetogame::GameSummary;
use crate::sources::github::RepositoryEntry;
use crate::types::SearchResult;

/// The two sources a search draws from.
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    /// Full catalog listing; filtered locally.
    async fn catalog(&self) -> Result<Vec<GameSummary>, SourceError>;

    /// Server-side repository search for `term`, at most `limit` items.
    async fn repositories(&self, term: &str, limit: usize) -> Result<Vec<RepositoryEntry>, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    Querying,
    Displaying,
    Empty,
    /// Shown exactly like `Empty`; the failure is only logged.
    Error,
}

/// What the host renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub query: String,
    pub phase: SearchPhase,
    pub results: Vec<SearchResult>,
    pub open: bool,
    pub loading: bool,
}

impl SearchView {
    fn new() -> Self {
        Self { query: String::new(), phase: SearchPhase::Idle, results: Vec::new(), open: false, loading: false }
    }

    /// Panel status line, if any. Errors deliberately read the same as no matches.
    pub fn status_line(&self) -> Option<String> {
        match self.phase {
            SearchPhase::Querying => Some("Searching...".to_string()),
            SearchPhase::Empty | SearchPhase::Error => {
                Some(format!("No games found for \"{}\".", self.query))
            }
            _ => None,
        }
    }
}

/// What the host should do after a result is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Navigate to the in-app detail view for this catalog id.
    Navigate(u64),
    /// Open this URL outside the app.
    OpenLink(String),
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub catalog_limit: usize,
    pub repository_limit: usize,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            debounce: cfg.debounce(),
            min_query_len: cfg.min_query_len,
            catalog_limit: cfg.catalog_limit,
            repository_limit: cfg.repository_limit,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

struct Inner {
    view: SearchView,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Debounced two-source search. Must be driven from inside a tokio runtime.
pub struct SearchController<B: SearchBackend> {
    backend: Arc<B>,
    settings: SearchSettings,
    shared: Arc<Shared>,
}

impl<B: SearchBackend> SearchController<B> {
    pub fn new(backend: Arc<B>, settings: SearchSettings) -> Self {
        let shared = Shared {
            inner: Mutex::new(Inner { view: SearchView::new(), generation: 0, pending: None }),
        };
        Self { backend, settings, shared: Arc::new(shared) }
    }

    pub fn view(&self) -> SearchView {
        self.shared.lock().view.clone()
    }

    /// The input text changed.
    pub fn input(&self, text: &str) {
        let mut inner = self.shared.lock();
        let generation = Self::supersede(&mut inner);
        inner.view.query = text.to_string();

        let term = text.trim().to_string();
        if term.chars().count() < self.settings.min_query_len {
            inner.view.results.clear();
            inner.view.open = false;
            inner.view.loading = false;
            inner.view.phase = SearchPhase::Idle;
            return;
        }

        inner.view.phase = SearchPhase::Debouncing;
        let task = tokio::spawn(run_query(
            self.backend.clone(),
            self.shared.clone(),
            self.settings.clone(),
            generation,
            term,
        ));
        inner.pending = Some(task);
    }

    /// A result row was picked.
    pub fn select(&self, result: &SearchResult) -> Selection {
        let mut inner = self.shared.lock();
        inner.view.open = false;
        match result {
            SearchResult::Primary(game) => {
                Self::supersede(&mut inner);
                inner.view.query.clear();
                inner.view.results.clear();
                inner.view.loading = false;
                inner.view.phase = SearchPhase::Idle;
                Selection::Navigate(game.id)
            }
            SearchResult::External(repo) => Selection::OpenLink(repo.html_url.clone()),
        }
    }

    /// A click landed outside the control. The query text is kept.
    pub fn click_outside(&self) {
        self.shared.lock().view.open = false;
    }

    /// The input regained focus.
    pub fn focus(&self) {
        let mut inner = self.shared.lock();
        if inner.view.query.trim().chars().count() >= self.settings.min_query_len {
            inner.view.open = true;
        }
    }

    /// Invalidate whatever is pending and return the new generation.
    fn supersede(inner: &mut Inner) -> u64 {
        inner.generation += 1;
        if let Some(task) = inner.pending.take() {
            task.abort();
        }
        inner.generation
    }
}

impl<B: SearchBackend> Drop for SearchController<B> {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().pending.take() {
            task.abort();
        }
    }
}

async fn run_query<B: SearchBackend>(
    backend: Arc<B>,
    shared: Arc<Shared>,
    settings: SearchSettings,
    generation: u64,
    term: String,
) {
    tokio::time::sleep(settings.debounce).await;

    {
        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        inner.view.phase = SearchPhase::Querying;
        inner.view.loading = true;
        inner.view.open = true;
    }

    debug!("Searching for {term:?}");
    let (catalog, repositories) = tokio::join!(
        backend.catalog(),
        backend.repositories(&term, settings.repository_limit)
    );
    let merged = catalog.and_then(|games| Ok((games, repositories?))).map(|(games, repos)| {
        merge(&term, games, repos, settings.catalog_limit, settings.repository_limit)
    });

    let mut inner = shared.lock();
    if inner.generation != generation {
        debug!("Discarding results for superseded query {term:?}");
        return;
    }
    inner.pending = None;
    inner.view.loading = false;
    match merged {
        Ok(results) => {
            inner.view.phase = if results.is_empty() { SearchPhase::Empty } else { SearchPhase::Displaying };
            inner.view.results = results;
        }
        Err(e) => {
            warn!("Search failed for {term:?}: {e}");
            inner.view.phase = SearchPhase::Error;
            inner.view.results.clear();
        }
    }
}

/// Catalog matches first (case-insensitive title substring), then repositories, each
/// in its source's order and capped.
pub fn merge(
    term: &str,
    games: Vec<GameSummary>,
    repositories: Vec<RepositoryEntry>,
    catalog_limit: usize,
    repository_limit: usize,
) -> Vec<SearchResult> {
    let needle = term.to_lowercase();
    games
        .into_iter()
        .filter(|g| g.title.to_lowercase().contains(&needle))
        .take(catalog_limit)
        .map(SearchResult::Primary)
        .chain(repositories.into_iter().take(repository_limit).map(SearchResult::External))
        .collect()
}
