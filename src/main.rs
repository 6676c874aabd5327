//! Development server.
//!
//! Usage:
//!   cargo run                 # build css/js/markdown, serve .tmp + source on PORT (5000)
//!   cargo run -- --dist       # full build, serve the publish tree on DIST_PORT (5001)
//!
//! Optional environment variables:
//! - SITE_CONFIG (defaults to config.yml)
//! - PORT, DIST_PORT

use anyhow::Result;
use portfolio_site::config::Config;
use portfolio_site::pipeline;
use portfolio_site::server::{self, ServeMode};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_site=info".parse()?),
        )
        .init();

    let dist = std::env::args().skip(1).any(|arg| arg == "--dist");
    let config = Config::from_env()?;

    if dist {
        info!("Building site into {}", config.publish_dir.display());
        pipeline::run_sequence(&config, &pipeline::default_sequence()).await?;
        server::serve(ServeMode::dist(&config), config.namespaces.clone(), config.dist_port).await
    } else {
        info!("Preparing development assets");
        pipeline::run_sequence(&config, &pipeline::serve_sequence()).await?;
        server::serve(ServeMode::dev(&config), config.namespaces.clone(), config.port).await
    }
}
