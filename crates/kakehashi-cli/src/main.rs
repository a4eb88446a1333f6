//! kakehashi binary
//!
//! ## Usage
//!
//! ```bash
//! kakehashi prefixes
//! kakehashi ls remote1://reports
//! kakehashi cp remote1://reports/q3.csv local://q3.csv
//! echo hello | kakehashi put scratch://greeting.txt
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use kakehashi_cli::{Cli, Config, build_filesystem, run};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref()).context("loading configuration")?;
    let fs = build_filesystem(&config).context("registering adapters")?;

    let mut stdout = std::io::stdout().lock();
    let result = run(&fs, &cli.command, cli.json, &mut stdout).await;

    if let Err(e) = fs.dispose_all().await {
        tracing::warn!("dispose failed: {}", e);
    }
    result
}
