//! Aggregation, proxy and incremental search over free-to-play game catalogs.
//!
//! The pieces, leaf first:
//! - [`sources`]: one adapter per provider (FreeToGame, F-Droid, GitHub, GamerPower)
//! - [`fetch`]: the single outbound HTTP seam, direct or relayed through a proxy
//! - [`proxy`]: the `/proxy` relay with its error envelope contract
//! - [`aggregator`]: concurrent fan-out behind `/games`
//! - [`search`]: debounced, cancellable two-source search
//! - [`server`]: the axum router wiring it all together

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mapping;
pub mod proxy;
pub mod search;
pub mod server;
pub mod sources;
pub mod types;

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::aggregator::Aggregator;
    pub use crate::client::CatalogClient;
    pub use crate::config::{AccessMode, CachePolicy, Config, SourceCaps};
    pub use crate::error::{DetailError, FetchError, ProxyError, SetupError, SourceError};
    pub use crate::fetch::{Access, FetchResponse, Fetcher, HttpFetcher};
    pub use crate::proxy::{Gateway, ProxyReply};
    pub use crate::search::{SearchBackend, SearchController, SearchPhase, SearchSettings, SearchView, Selection};
    pub use crate::server::{router, AppState};
    pub use crate::sources::freetogame::{GameDetails, GameFilter, GameSummary};
    pub use crate::sources::gamerpower::GiveawayFilter;
    pub use crate::sources::github::RepositoryEntry;
    pub use crate::types::{CatalogEntry, GamesResponse, GiveawayEntry, SearchResult, SourceTag};
}
