//! Chatstore CLI - standalone message store server

use chatstore::config::{expand_path, Storage};
use chatstore::{Config, Core};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chatstore")]
#[command(author = "Chatstore Team")]
#[command(version)]
#[command(about = "Chatstore - HTTP store for chat messages", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.chatstore/config.toml")]
    config: PathBuf,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Keep messages in memory only
    #[arg(long)]
    memory: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config_path = expand_path(&args.config);

    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
        } else {
            Config::create_default(&config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
        }
        return Ok(());
    }

    let config = resolve_config(&args, &config_path)?;
    Core::new(config).start_api_server().await?;

    Ok(())
}

/// `RUST_LOG` wins; otherwise chatstore at info (debug with --verbose)
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chatstore={},tower_http=debug", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// File (or defaults), then CHATSTORE_* env vars, then command-line flags.
fn resolve_config(args: &Args, config_path: &Path) -> chatstore::Result<Config> {
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        tracing::warn!(
            "No config at {}, running with defaults",
            config_path.display()
        );
        Config::default()
    };
    config.apply_env_overrides();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if args.memory {
        config.storage = Storage::Memory;
    }

    Ok(config)
}
