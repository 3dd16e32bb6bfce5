//! Stakeshare command line driver
//!
//! Runs the payout computation offline against a recorded snapshot fixture
//! and prints per-cycle summaries and final payouts as JSON.

mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use settings::AppConfig;
use stakeshare_payouts::{
    final_payouts, parse_delegated_addresses, shares_balanced, sum_shares, ContractLedger,
    CycleAggregator, CycleSummary, FinalPayout, InMemorySnapshotProvider, SHARE_SUM_TOLERANCE,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stakeshare")]
#[command(about = "Delegator payout calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute payouts over a cycle range
    Compute(RunArgs),
    /// Compute a cycle range and report per-cycle share sums
    Verify(RunArgs),
    /// Extract delegated addresses from a saved RPC response
    Addresses {
        /// File holding the raw response body
        file: PathBuf,
        /// Input is newest-first; print oldest-first
        #[arg(long)]
        reverse: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Snapshot fixture (JSON)
    #[arg(long)]
    snapshots: Option<PathBuf>,
    /// Baker address
    #[arg(long)]
    delegate: Option<String>,
    /// First cycle
    #[arg(long = "from")]
    cycle_start: Option<u64>,
    /// Last cycle (inclusive)
    #[arg(long = "to")]
    cycle_end: Option<u64>,
    /// Fee rate, e.g. 0.1
    #[arg(long)]
    fee_rate: Option<Decimal>,
    /// Disable the complete-roll hard cap
    #[arg(long)]
    no_spillage: bool,
    /// Compute cycles concurrently
    #[arg(long)]
    parallel: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.snapshots {
            config.snapshots = Some(path.clone());
        }
        if let Some(delegate) = &self.delegate {
            config.delegate = Some(delegate.clone());
        }
        if self.cycle_start.is_some() {
            config.cycle_start = self.cycle_start;
        }
        if self.cycle_end.is_some() {
            config.cycle_end = self.cycle_end;
        }
        if let Some(rate) = self.fee_rate {
            config.fee_rate = rate;
        }
        if self.no_spillage {
            config.spillage = false;
        }
        if self.parallel {
            config.parallel = true;
        }
    }
}

#[derive(Serialize)]
struct ComputeReport {
    delegate: String,
    cycles: Vec<CycleSummary>,
    payouts: Vec<FinalPayout>,
    total_payout: Decimal,
}

#[derive(Serialize)]
struct ShareCheck {
    cycle: u64,
    share_sum: Decimal,
    balanced: bool,
    spilled: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compute(args) => {
            args.apply(&mut config);
            init_logging(&config)?;
            let (ledger, cycles) = run(&config)?;
            let report = ComputeReport {
                delegate: config.delegate()?.to_string(),
                cycles,
                payouts: final_payouts(&ledger),
                total_payout: ledger.total_payout(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Verify(args) => {
            args.apply(&mut config);
            init_logging(&config)?;
            let (ledger, cycles) = run(&config)?;
            let checks: Vec<ShareCheck> = cycles
                .iter()
                .map(|summary| ShareCheck {
                    cycle: summary.cycle,
                    share_sum: sum_shares(summary.cycle, ledger.iter()),
                    balanced: shares_balanced(summary.cycle, ledger.iter(), SHARE_SUM_TOLERANCE),
                    spilled: summary.spilled,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&checks)?);
        }
        Commands::Addresses { file, reverse } => {
            init_logging(&config)?;
            let body = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let mut addresses = parse_delegated_addresses(&body)?;
            if reverse {
                addresses.reverse();
            }
            for address in addresses {
                println!("{address}");
            }
        }
    }

    Ok(())
}

fn run(config: &AppConfig) -> Result<(ContractLedger, Vec<CycleSummary>)> {
    let delegate = config.delegate()?;
    let (start, end) = config.cycle_range()?;
    let params = config.params()?;

    let path = config.snapshots()?;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot fixture {}", path.display()))?;
    let provider: InMemorySnapshotProvider = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse snapshot fixture {}", path.display()))?;

    let aggregator = CycleAggregator::new(&provider, delegate, params)?;
    let mut ledger = aggregator.load_ledger(Some(start))?;
    info!(
        "Loaded {} delegators for {} at cycle {}",
        ledger.len(),
        aggregator.delegate(),
        start
    );

    let cycles = if config.parallel {
        aggregator.process_cycle_range_parallel(&mut ledger, start, end)?
    } else {
        aggregator.process_cycle_range(&mut ledger, start, end)?
    };

    Ok((ledger, cycles))
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Reports go to stdout; logs stay on stderr.
    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
