use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use passback_core::MockAgsClient;
use passback_server::PassbackServer;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "passback", about = "LTI Advantage grade passback service")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the passback server
    Serve(ServeArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Debug, Args)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session TTL in seconds
    #[arg(long)]
    ttl_secs: Option<u64>,
}

/// Arguments for the config command
#[derive(Debug, Args)]
struct ConfigArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Config(args) => show_config(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = CliConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(ttl_secs) = args.ttl_secs {
        config.core.session_ttl_secs = ttl_secs;
    }

    // The real AGS transport lives in the embedding LTI provider; the
    // standalone binary runs against the in-memory platform stub so the
    // whole launch/update/grade loop can be exercised locally.
    tracing::warn!("no AGS transport configured; using the in-memory platform stub");
    let client = Arc::new(MockAgsClient::new());

    let server = PassbackServer::new(config.server_config(), config.core, client);
    server.run().await?;
    Ok(())
}

fn show_config(args: ConfigArgs) -> Result<()> {
    let config = CliConfig::load(args.config.as_deref())?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
