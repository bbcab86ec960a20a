//! Nomad health check CLI
//!
//! Monitoring plugin that evaluates Nomad workloads and reports a single
//! status line with a Sensu/Nagios compatible exit code.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nomad_check::client::DEFAULT_NOMAD_URL;
use nomad_check::{
    check_leader, Evaluator, EvaluatorConfig, NomadClient, NomadConfig, Report, Severity,
    Thresholds,
};

/// Nomad workload health check
#[derive(Parser)]
#[command(name = "check-nomad")]
#[command(about = "Nomad workload health check - placement failures, stuck allocations, restart storms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Nomad server address
    #[arg(long, env = "NOMAD_ADDR", default_value = DEFAULT_NOMAD_URL, global = true)]
    nomad: String,

    /// Nomad ACL token
    #[arg(long, env = "NOMAD_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Timeout of a single API request in seconds
    #[arg(long, default_value = "10", global = true)]
    request_timeout: u64,

    /// Output format (text or json)
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log format on stderr (text or json)
    #[arg(long, default_value = "text", global = true)]
    log_format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every registered job, its evaluations and allocations
    Jobs(JobsArgs),
    /// Check that a cluster leader is elected
    Leader,
}

#[derive(Args)]
struct JobsArgs {
    /// Seconds a task may stay pending since its last event
    #[arg(long, default_value = "300")]
    pending_threshold: u64,

    /// Seconds an allocation may wait to be picked up by a client
    #[arg(long, default_value = "600")]
    client_pending_threshold: u64,

    /// Restarts within the window that raise a restart storm
    #[arg(long, default_value = "3")]
    restart_limit: u32,

    /// Restart window in seconds
    #[arg(long, default_value = "3600")]
    restart_window: u64,

    /// Jobs fetched in parallel
    #[arg(long, default_value = "8")]
    concurrency: usize,

    /// Timeout of the whole pass in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Also report task groups with failed allocations in the job summary
    #[arg(long)]
    summary_failures: bool,

    /// Report OK when no jobs are registered
    #[arg(long)]
    allow_empty: bool,
}

impl JobsArgs {
    fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            thresholds: Thresholds {
                pending_secs: self.pending_threshold,
                client_pending_secs: self.client_pending_threshold,
                restart_limit: self.restart_limit,
                restart_window_secs: self.restart_window,
            },
            concurrency: self.concurrency,
            summary_failures: self.summary_failures,
            allow_empty: self.allow_empty,
        }
    }
}

fn init_tracing(verbose: bool, format: OutputFormat) {
    let default = if verbose { "nomad_check=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        OutputFormat::Json => builder.json().init(),
        OutputFormat::Text => builder.init(),
    }
}

fn print_report(check: &str, report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{check} {}: {}", report.severity, report.message),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize report")?
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let client = NomadClient::new(NomadConfig {
        base_url: cli.nomad.clone(),
        token: cli.token.clone().filter(|t| !t.is_empty()),
        timeout_secs: cli.request_timeout,
    });

    let check = match cli.command {
        Commands::Jobs(_) => "CheckNomadJobs",
        Commands::Leader => "CheckNomadLeader",
    };

    let report = match (&cli.command, client) {
        (_, Err(e)) => Report::status(Severity::Unknown, e.to_string()),
        (Commands::Jobs(args), Ok(client)) => {
            debug!(nomad = %cli.nomad, "Checking Nomad jobs");
            let evaluator = Evaluator::new(client, args.evaluator_config());
            evaluator.check(Duration::from_secs(args.timeout)).await
        }
        (Commands::Leader, Ok(client)) => {
            debug!(nomad = %cli.nomad, "Checking Nomad leader");
            check_leader(&client).await
        }
    };

    print_report(check, &report, cli.format)?;
    std::process::exit(report.severity.exit_code());
}
