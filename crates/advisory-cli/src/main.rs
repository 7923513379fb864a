//! Farm advisory command-line interface.
//!
//! ## Commands
//!
//! - `run`: Produce one advisory from a request JSON file
//! - `rules show`: Print a conflict-rule table as TOML
//! - `rules check`: Validate a conflict-rule table

use std::path::{Path, PathBuf};
use std::time::Duration;

use advisory_core::telemetry::init_tracing;
use advisory_core::{
    AdvisoryOutcome, AdvisoryRequest, AgentRegistry, AggregationReport, Aggregator,
    AggregatorConfig, ConflictRuleTable,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "advisory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Unified farm advisories from per-domain agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one advisory with the built-in agents
    Run {
        /// Path to an advisory request (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// Shared agent deadline in milliseconds
        #[arg(
            long,
            default_value_t = 1800,
            value_parser = clap::value_parser!(u64).range(1..=600_000)
        )]
        deadline_ms: u64,

        /// Conflict-rule table (TOML); built-in table when omitted
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,

        /// Print per-agent outcomes to stderr
        #[arg(long)]
        report: bool,
    },

    /// Inspect conflict-rule tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print a rule table as TOML
    Show {
        /// Rule table to print (default: built-in table)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Load and validate a rule table
    Check {
        /// Path to the rule table
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            request,
            deadline_ms,
            rules,
            pretty,
            report,
        } => {
            cmd_run(
                &request,
                Duration::from_millis(deadline_ms),
                rules.as_deref(),
                pretty,
                report,
            )
            .await
        }
        Commands::Rules { action } => match action {
            RulesAction::Show { file } => cmd_rules_show(file.as_deref()),
            RulesAction::Check { path } => cmd_rules_check(&path),
        },
    }
}

fn load_rules(path: Option<&Path>) -> Result<ConflictRuleTable> {
    match path {
        Some(path) => ConflictRuleTable::load(path)
            .with_context(|| format!("Failed to load rule table {}", path.display())),
        None => Ok(ConflictRuleTable::standard()),
    }
}

fn read_request(path: &Path) -> Result<AdvisoryRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid advisory request in {}", path.display()))
}

async fn produce_advisory(
    request: AdvisoryRequest,
    deadline: Duration,
    rules: Option<&Path>,
) -> Result<AdvisoryOutcome> {
    let aggregator = Aggregator::new(
        AgentRegistry::builtin(),
        load_rules(rules)?,
        AggregatorConfig { deadline },
    );
    debug!(agents = aggregator.agents().len(), "running advisory");
    aggregator
        .advise(request)
        .await
        .context("Advisory failed")
}

/// Run one advisory and print the response
async fn cmd_run(
    request: &Path,
    deadline: Duration,
    rules: Option<&Path>,
    pretty: bool,
    report: bool,
) -> Result<()> {
    let outcome = produce_advisory(read_request(request)?, deadline, rules).await?;

    if report {
        eprintln!("{}", render_report(&outcome.report));
    }
    let body = if pretty {
        serde_json::to_string_pretty(&outcome.response)?
    } else {
        serde_json::to_string(&outcome.response)?
    };
    println!("{}", body);
    Ok(())
}

fn render_report(report: &AggregationReport) -> String {
    let mut lines = vec![format!("request {}", report.request_id)];
    for (agent, outcome) in &report.outcomes {
        let status = serde_json::to_value(outcome)
            .ok()
            .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(str::to_string))
            .unwrap_or_default();
        lines.push(format!("  {:<16} {}", agent, status));
    }
    for clamp in &report.clamps {
        lines.push(format!(
            "  clamped {}.{}: {} -> {}",
            clamp.agent, clamp.field, clamp.received, clamp.applied
        ));
    }
    for resolution in &report.resolutions {
        lines.push(format!(
            "  rule {} ({}) between {} and {}",
            resolution.rule_id, resolution.action, resolution.agents[0], resolution.agents[1]
        ));
    }
    lines.join("\n")
}

fn cmd_rules_show(file: Option<&Path>) -> Result<()> {
    let table = load_rules(file)?;
    print!("{}", table.to_toml_string()?);
    Ok(())
}

fn cmd_rules_check(path: &Path) -> Result<()> {
    let table = load_rules(Some(path))?;
    println!("{}: {} rules OK", path.display(), table.len());
    for rule in &table.rules {
        println!(
            "  {:<32} {} vs {} -> {}",
            rule.id,
            rule.agents[0],
            rule.agents[1],
            rule.action.kind()
        );
    }
    Ok(())
}
