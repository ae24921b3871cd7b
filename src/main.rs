//! Pharos - Personalized Feed Decision Core
//!
//! Main entry point for the Pharos service: HTTP API server, database
//! initialization, and a debug command for inspecting effective settings.

use clap::{Parser, Subcommand};
use pharos_core::{
    api::{ApiServer, ApiServerConfig},
    config::PharosConfig,
    error::Result,
    personalization::PersonalizationEngine,
    settings::{Catalog, SettingsStore},
    storage::{self, ConnectionMode},
    FeedId,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pharos")]
#[command(about = "Personalized feed settings and ranking service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database path (overrides PHAROS_DB_PATH env var and config file)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Server address (overrides config file)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Initialize database
    Init,

    /// Print effective settings for a feed, with provenance
    Resolve {
        /// Feed id
        #[arg(long)]
        feed: String,
    },
}

/// Get the database path from CLI arg, env var, or config
fn get_db_path(cli_path: Option<String>, config: &PharosConfig) -> String {
    cli_path
        .or_else(|| std::env::var("PHAROS_DB_PATH").ok())
        .unwrap_or_else(|| config.database.path.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "pharos={},tower_http=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Pharos v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = PharosConfig::load(cli.config.as_deref())?;
    let db_path = get_db_path(cli.db_path.clone(), &config);

    match cli.command {
        Commands::Serve { addr } => {
            let db = Arc::new(storage::open(&ConnectionMode::Local(db_path.clone())).await?);
            storage::init_schema(&db).await?;

            let catalog = Catalog::new(db.clone());
            let settings = Arc::new(SettingsStore::new(db.clone(), catalog));
            let engine = Arc::new(PersonalizationEngine::new(db, &config.personalization));

            let socket_addr = match addr {
                Some(raw) => raw.parse().map_err(|e| {
                    pharos_core::PharosError::Other(format!("Invalid address '{}': {}", raw, e))
                })?,
                None => config.server.addr()?,
            };

            println!();
            println!("Pharos API server");
            println!("   Address:  http://{}", socket_addr);
            println!("   Database: {}", db_path);
            println!();
            println!("   Endpoints:");
            println!("   • GET    /feeds/:id/effective-settings - resolved settings + provenance");
            println!("   • PUT    /settings/:scope/:id - store a scope override");
            println!("   • DELETE /settings/:scope/:id - revert a scope to inherit");
            println!("   • POST   /feedback - ingest one feedback event");
            println!("   • POST   /users/:id/reset-learning - delete learned patterns");
            println!("   • GET    /users/:id/patterns - learned patterns");
            println!("   • POST   /rank - rank candidates with score components");
            println!("   • GET    /health - health check");
            println!();

            let server = ApiServer::new(
                ApiServerConfig { addr: socket_addr },
                settings,
                engine,
                config.personalization.clone(),
            );
            server.serve().await?;
            Ok(())
        }
        Commands::Init => {
            debug!("Initializing database at {}", db_path);
            let db = storage::open(&ConnectionMode::Local(db_path.clone())).await?;
            storage::init_schema(&db).await?;
            println!("✓ Database initialized: {}", db_path);
            Ok(())
        }
        Commands::Resolve { feed } => {
            let db = Arc::new(storage::open(&ConnectionMode::Local(db_path)).await?);
            let catalog = Catalog::new(db.clone());
            let settings = SettingsStore::new(db, catalog);

            let feed_id = FeedId::from_string(&feed)?;
            let effective = settings.effective_for_feed(feed_id).await?;

            println!("Effective settings for feed {}:", feed_id);
            println!(
                "  refresh_interval_minutes = {:<6} (from {})",
                effective.refresh_interval_minutes.value, effective.refresh_interval_minutes.source
            );
            println!(
                "  max_articles             = {:<6} (from {})",
                effective.max_articles.value, effective.max_articles.source
            );
            println!(
                "  max_article_age_days     = {:<6} (from {})",
                effective.max_article_age_days.value, effective.max_article_age_days.source
            );
            println!(
                "  extraction_method        = {:<6} (from {})",
                effective.extraction_method.value.to_string(),
                effective.extraction_method.source
            );
            Ok(())
        }
    }
}
