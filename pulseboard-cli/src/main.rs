//! PulseBoard CLI — ranked snapshots and CSV export over the synthetic source.
//!
//! Commands:
//! - `snapshot` — run the pipeline for a filter scope and print the ranked table
//! - `export` — same scope, CSV to stdout or a file
//! - `catalog` — list the accounts the synthetic source knows about

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use pulseboard_core::datasource::SyntheticSource;
use pulseboard_core::domain::{EntityId, FilterState, MetricKind, Platform, SortDirection};
use pulseboard_core::export::export_csv;
use pulseboard_core::timerange::{RangePreset, TimeRangeSelection};
use pulseboard_runner::{DashboardConfig, DashboardController, RankingTable};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pulseboard",
    about = "PulseBoard CLI — competitive social-media analytics engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the aggregation pipeline and print the ranked table.
    Snapshot {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Page of the ranked table to print (0-based).
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Export the ranked result set as CSV.
    Export {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the accounts in the synthetic catalog.
    Catalog {
        /// Seed for the synthetic source.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(clap::Args)]
struct ScopeArgs {
    /// Range preset: 24h, 7d, 30d, 90d. Ignored when --from/--to are given.
    #[arg(long, default_value = "7d")]
    range: String,

    /// Custom range start (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,

    /// Custom range end (RFC 3339 or YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,

    /// IANA timezone for preset anchoring and labels.
    #[arg(long, default_value = "UTC")]
    tz: String,

    /// Platforms to include (comma-separated). Defaults to all.
    #[arg(long)]
    platforms: Option<String>,

    /// Account ids to include (comma-separated). Defaults to the full catalog.
    #[arg(long)]
    accounts: Option<String>,

    /// Primary metric to rank by.
    #[arg(long, default_value = "views")]
    metric: String,

    /// Sort ascending instead of descending.
    #[arg(long, default_value_t = false)]
    ascending: bool,

    /// Seed for the synthetic source.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Path to a TOML dashboard config.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Snapshot { scope, page } => cmd_snapshot(scope, page),
        Commands::Export { scope, out } => cmd_export(scope, out),
        Commands::Catalog { seed } => cmd_catalog(seed),
    }
}

fn cmd_snapshot(scope: ScopeArgs, page: usize) -> Result<()> {
    let (mut controller, source) = build_controller(&scope)?;
    let now = Utc::now();
    let snapshot = controller
        .snapshot(now, &source)
        .context("pipeline run failed")?;

    println!("Range:  {}", snapshot.range.label);
    println!("Metric: {}", snapshot.result_set.metric.label());
    if snapshot.is_no_data() {
        println!("No data for the selected scope.");
        return Ok(());
    }

    let page_size = controller.config().page_size;
    let table = RankingTable::from_result_set(&snapshot.result_set, page, page_size);
    if table.rows.is_empty() {
        bail!("page {page} is out of range (pages: {})", table.page_count);
    }

    println!(
        "{:>4}  {:<28} {:<10} {:>12} {:>10}",
        "#", "Account", "Platform", table.metric_label, "% total"
    );
    for row in &table.rows {
        println!(
            "{:>4}  {:<28} {:<10} {:>12} {:>10}",
            row.rank,
            row.name,
            row.platform.to_string(),
            if row.value.is_empty() { "—" } else { &row.value },
            if row.percent_of_total.is_empty() {
                "—"
            } else {
                &row.percent_of_total
            },
        );
    }
    println!(
        "{:>4}  {:<28} {:<10} {:>12}",
        "", "Total", "", table.total
    );
    println!("Page {}/{}", page + 1, table.page_count);
    Ok(())
}

fn cmd_export(scope: ScopeArgs, out: Option<PathBuf>) -> Result<()> {
    let (mut controller, source) = build_controller(&scope)?;
    let snapshot = controller
        .snapshot(Utc::now(), &source)
        .context("pipeline run failed")?;
    let csv = export_csv(&snapshot.result_set)?;
    match out {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn cmd_catalog(seed: u64) -> Result<()> {
    let source = SyntheticSource::demo(seed);
    println!("{:<22} {:<10} {}", "Id", "Platform", "Ownership");
    for entry in source.catalog() {
        println!(
            "{:<22} {:<10} {}",
            entry.id.as_str(),
            entry.platform.to_string(),
            if entry.owned { "own" } else { "competitor" }
        );
    }
    Ok(())
}

fn build_controller(scope: &ScopeArgs) -> Result<(DashboardController, SyntheticSource)> {
    let config = match &scope.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    let timezone: chrono_tz::Tz = scope
        .tz
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", scope.tz))?;

    let time_range = match (&scope.from, &scope.to) {
        (Some(from), Some(to)) => {
            TimeRangeSelection::custom(parse_instant(from)?, parse_instant(to)?)
        }
        (None, None) => {
            let preset: RangePreset = scope
                .range
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            TimeRangeSelection::preset(preset)
        }
        _ => bail!("--from and --to must be given together"),
    };

    let source = SyntheticSource::demo(scope.seed);

    let platforms: BTreeSet<Platform> = match &scope.platforms {
        Some(list) => parse_list(list)?,
        None => Platform::ALL.into_iter().collect(),
    };
    let accounts: BTreeSet<EntityId> = match &scope.accounts {
        Some(list) => list
            .split(',')
            .map(|s| EntityId::new(s.trim()))
            .collect(),
        None => source.catalog().iter().map(|e| e.id.clone()).collect(),
    };
    let metric: MetricKind = scope
        .metric
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let filter = FilterState::new()
        .with_time_range(time_range)
        .with_timezone(timezone)
        .with_platforms(platforms)
        .with_accounts(accounts)
        .with_primary_metric(metric)
        .with_sort_direction(if scope.ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        });

    Ok((DashboardController::with_filter(config, filter), source))
}

fn parse_list(list: &str) -> Result<BTreeSet<Platform>> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse::<Platform>()
                .map_err(|e| anyhow::anyhow!(e))
        })
        .collect()
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date: NaiveDate = text
        .parse()
        .with_context(|| format!("invalid instant '{text}': expected RFC 3339 or YYYY-MM-DD"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}
