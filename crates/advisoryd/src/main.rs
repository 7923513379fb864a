use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use advisory_core::metrics::METRICS;
use advisory_core::telemetry::init_tracing;
use advisoryd::cors::build_cors_layer;
use advisoryd::{build_aggregator, router, AppState, Settings};
use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "advisoryd")]
#[command(about = "Serve unified farm advisories over HTTP")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "ADVISORY_BIND", default_value = "0.0.0.0:8001")]
    bind: SocketAddr,

    /// Shared agent deadline in milliseconds
    #[arg(
        long,
        env = "ADVISORY_DEADLINE_MS",
        default_value_t = 1800,
        value_parser = clap::value_parser!(u64).range(1..=600_000)
    )]
    deadline_ms: u64,

    /// TOML conflict-rule table (built-in table when omitted)
    #[arg(long, env = "ADVISORY_RULES")]
    rules: Option<PathBuf>,

    /// TOML file mapping agent ids to remote endpoints
    #[arg(long, env = "ADVISORY_AGENTS")]
    agents: Option<PathBuf>,

    /// Comma-separated allowed CORS origins (any when empty)
    #[arg(long, env = "ADVISORY_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Emit JSON log lines
    #[arg(long, env = "ADVISORY_LOG_JSON")]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let aggregator = build_aggregator(&Settings {
        deadline: Duration::from_millis(cli.deadline_ms),
        rules_path: cli.rules,
        agents_path: cli.agents,
    })?;

    let shutdown = CancellationToken::new();
    let app = router(AppState::new(aggregator, shutdown.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&cli.cors_origins));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!("advisoryd listening on {}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    METRICS.flush();
    Ok(())
}
