mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Commands};
use freeplay::prelude::*;
use freeplay::server::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("freeplay=info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            start_server(config).await?;
        }
        Commands::Games => {
            let state = AppState::from_config(&config)?;
            let games = state.aggregator.list_games().await;
            for g in &games {
                println!("[{}] {} ({})", g.source, g.title, g.id);
            }
            println!("{} games", games.len());
        }
        Commands::Proxy { url } => {
            let state = AppState::from_config(&config)?;
            match state.gateway.relay(Some(&url)).await {
                Ok(reply) => println!("{}\n{}", reply.status, serde_json::to_string_pretty(&reply.body)?),
                Err(e) => println!("{}\n{}", e.status(), e.envelope()),
            }
        }
        Commands::Search { query } => {
            let client = catalog_client(&config)?;
            let settings = SearchSettings::from(&config.search);
            let deadline = settings.debounce + config.upstream.timeout() + Duration::from_secs(1);
            let search = SearchController::new(Arc::new(client), settings);

            search.input(&query);
            let started = tokio::time::Instant::now();
            let view = loop {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let view = search.view();
                let settled = !matches!(view.phase, SearchPhase::Debouncing | SearchPhase::Querying);
                if settled || started.elapsed() > deadline {
                    break view;
                }
            };
            if let Some(line) = view.status_line() {
                println!("{line}");
            }
            for r in &view.results {
                println!("{} - {}", r.title(), r.subtitle());
            }
        }
        Commands::Giveaways { kind, platform } => {
            let client = catalog_client(&config)?;
            let filter = GiveawayFilter { giveaway_type: kind, platform, sort_by: None };
            for g in client.giveaways(&filter).await? {
                let worth = g.worth.as_deref().unwrap_or("free");
                println!("{} [{}] {} ends {}", g.title, worth, g.platforms.join(", "), g.end_date.as_deref().unwrap_or("N/A"));
            }
        }
        Commands::Details { id } => {
            let client = catalog_client(&config)?;
            let details = client.game_details(id).await?;
            println!("{} ({})", details.summary.title, details.summary.platform);
            println!("{}", details.description);
            if let Some(req) = details.minimum_system_requirements {
                println!("Minimum: {} / {} / {} / {}", req.os, req.processor, req.memory, req.graphics);
            }
        }
    }
    Ok(())
}

fn catalog_client(config: &Config) -> Result<CatalogClient> {
    let fetcher = Arc::new(HttpFetcher::new(config.upstream.timeout())?);
    Ok(CatalogClient::from_config(fetcher, &config.upstream)?)
}
