use chemkg::api::ApiServer;
use chemkg::services::get_dashboard_stats;
use chemkg::{Config, Repository};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    // Load configuration before logging so its log level can be the default
    let config = Config::load()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.chemkg.log_level.as_str()),
    )
    .init();

    match command {
        "serve" => {
            run_http_server(config).await?;
        }
        "verify" => {
            run_verification(config).await?;
        }
        other => {
            log::warn!("Unknown command '{}', running verify", other);
            run_verification(config).await?;
        }
    }

    Ok(())
}

/// Run the JSON API
async fn run_http_server(config: Config) -> Result<()> {
    log::info!("Starting chemkg HTTP server v{}", env!("CARGO_PKG_VERSION"));

    let repo = Repository::from_config(&config)?;
    log::info!(
        "GraphDB: {} (repository '{}', infer={})",
        config.graphdb.base_url,
        config.graphdb.repository,
        config.graphdb.infer
    );

    let server = ApiServer::new(repo, &config);
    server.run(config.http_server.port).await?;

    Ok(())
}

/// Check that the configured repository answers a query
async fn run_verification(config: Config) -> Result<()> {
    log::info!("Starting chemkg v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Configuration loaded successfully");
    log::info!("GraphDB endpoint: {}", config.graphdb.base_url);
    log::info!("Repository: {}", config.graphdb.repository);
    log::info!("Result cache capacity: {}", config.cache.capacity);

    let repo = Repository::from_config(&config)?;
    let stats = get_dashboard_stats(&repo).await?;

    log::info!("✓ Repository reachable");
    log::info!(
        "✓ {} reactions, {} compounds, {} patents",
        stats.total_reactions,
        stats.total_compounds,
        stats.patents_covered
    );

    Ok(())
}
