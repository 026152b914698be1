//! Court Relay CLI — the process entry point.
//!
//! A single `serve` command resolves configuration from flags and
//! environment, then hands off to `courtrelay_gateway::start`.

use clap::Parser;
use courtrelay_config::{CliOverrides, RelayConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "courtrelay",
    about = "Court Relay — bidirectional WebSocket relay for volleyball streaming control",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// WebSocket-level shared secret; empty disables WS-level auth
    #[arg(long)]
    password: Option<String>,

    /// Directory holding sessions.json, scout-current.json, matchday-current.json, archive/
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory served to authenticated clients
    #[arg(long, default_value = "./public")]
    static_dir: PathBuf,

    /// 6-digit login PIN; overrides AUTH_PIN
    #[arg(long)]
    pin: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::resolve(CliOverrides {
        port: cli.port,
        ws_password: cli.password,
        data_dir: cli.data,
        static_dir: Some(cli.static_dir),
        pin: cli.pin,
    })?;

    courtrelay_gateway::start(config).await
}
