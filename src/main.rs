mod allocate;
mod dates;
mod emit;
mod error;
mod gitops;
mod store;
mod summary;
mod util;

use std::path::Path;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::allocate::{AllocConfig, DEFAULT_MAX_PER_DAY, DEFAULT_ZERO_PCT};
use crate::gitops::GitCli;
use crate::summary::Summary;
use crate::util::{parse_lenient, parse_lenient_int};

#[derive(Parser, Debug)]
#[command(name = "backdate", version, about = "Backfill a year of plausible-looking commit activity")]
struct Cli {
    /// Print the plan and summary only; no file or git changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Push after all commits
    #[arg(long)]
    push: bool,

    /// Total commits to spread over the year (default: 1.5 per active day)
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "",
        allow_negative_numbers = true
    )]
    target: Option<String>,

    /// Upper bound on commits for a single day
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "",
        allow_negative_numbers = true
    )]
    max_per_day: Option<String>,

    /// Fraction of days left without commits
    #[arg(
        long,
        value_name = "F",
        num_args = 0..=1,
        default_missing_value = "",
        allow_negative_numbers = true
    )]
    zero_pct: Option<String>,

    /// Seed for reproducible allocations
    #[arg(long)]
    seed: Option<u64>,

    /// Last day of the window (default: today, local time)
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<NaiveDate>,

    /// Remote to push to (default: the branch's upstream)
    #[arg(long)]
    remote: Option<String>,

    /// Branch to push
    #[arg(long, requires = "remote")]
    branch: Option<String>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn alloc_config(&self) -> AllocConfig {
        let target = parse_lenient_int(self.target.as_deref())
            .map(|t| t.clamp(0, u32::MAX as i64) as u32);
        if self.target.as_deref().is_some_and(|s| !s.trim().is_empty()) && target.is_none() {
            warn!(value = ?self.target, "ignoring non-numeric --target");
        }
        let max_per_day = parse_lenient_int(self.max_per_day.as_deref())
            .map(|m| m.clamp(1, u32::MAX as i64) as u32)
            .unwrap_or_else(|| {
                if self.max_per_day.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                    warn!(value = ?self.max_per_day, "ignoring --max-per-day, using {DEFAULT_MAX_PER_DAY}");
                }
                DEFAULT_MAX_PER_DAY
            });
        let zero_pct = parse_lenient::<f64>(self.zero_pct.as_deref())
            .filter(|p| p.is_finite())
            .unwrap_or_else(|| {
                if self.zero_pct.is_some() {
                    warn!(value = ?self.zero_pct, "ignoring --zero-pct, using {DEFAULT_ZERO_PCT}");
                }
                DEFAULT_ZERO_PCT
            });
        AllocConfig { target, max_per_day, zero_pct: zero_pct.clamp(0.0, 1.0) }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let today = cli.today.unwrap_or_else(util::today_local);
    let days = dates::generate_dates(today);

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, "allocating {} days ending {today}", days.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let alloc = allocate::allocate(&days, &cli.alloc_config(), &mut rng);

    print!("{}", Summary::of(&alloc).render()?);
    println!();

    // dry runs never reach git
    let mut git = if cli.dry_run {
        GitCli::new(".")
    } else {
        GitCli::open(".").context("backdate must run inside a git work tree")?
    }
    .with_destination(cli.remote.clone(), cli.branch.clone());

    let report = emit::emit_all(&mut git, &alloc, Path::new(store::MARKER_PATH), cli.dry_run, cli.push)?;

    if cli.dry_run {
        println!("Dry run: {} commits planned, nothing written.", alloc.total());
        return Ok(());
    }
    println!(
        "Created {} commits ({} skipped across {} failed days).",
        report.created, report.skipped, report.failed_days
    );
    if report.pushed == Some(true) {
        println!("Pushed.");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
