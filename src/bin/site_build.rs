//! Build binary - runs the full production build, or selected tasks.
//!
//! Usage:
//!   cargo run --bin site-build                     # clean, library, then all asset tasks
//!   cargo run --bin site-build -- build:css build:js # only the named tasks, concurrently
//!
//! Optional environment variables:
//! - SITE_CONFIG (defaults to config.yml)

use anyhow::{bail, Result};
use portfolio_site::config::Config;
use portfolio_site::pipeline::{self, Task};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_site=info".parse()?),
        )
        .init();

    let names: Vec<String> = std::env::args().skip(1).collect();
    let phases = if names.is_empty() {
        pipeline::default_sequence()
    } else {
        let mut tasks = Vec::new();
        for name in &names {
            match Task::from_name(name) {
                Some(task) => tasks.push(task),
                None => {
                    let known: Vec<&str> = Task::all().iter().map(|t| t.name()).collect();
                    bail!("Unknown task '{}'. Known tasks: {}", name, known.join(", "));
                }
            }
        }
        vec![tasks]
    };

    let config = Config::from_env()?;
    let summaries = pipeline::run_sequence(&config, &phases).await?;

    for summary in &summaries {
        info!("{:<16} {:>5} files {:>10} bytes", summary.task, summary.files, summary.bytes);
    }
    Ok(())
}
