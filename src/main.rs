use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use worldcomp::core::{CompositorConfig, Server};

/// Headless host for the world compositor.
#[derive(Parser, Debug)]
#[command(name = "worldcomp", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket name, overriding the configuration
    #[arg(short, long)]
    socket: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,worldcomp=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_ansi(false)
        .init();

    let mut config = match &args.config {
        Some(path) => CompositorConfig::load(path)?,
        None => CompositorConfig::default(),
    };
    if let Some(socket) = args.socket {
        config.socket_name = socket;
    }

    let mut server = Server::new(config).context("Failed to start compositor")?;
    server.run()
}
