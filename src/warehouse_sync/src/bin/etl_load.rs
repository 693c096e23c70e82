use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use metrics_ingestor::providers::{
    cloudflare_radar::CloudflareRadarProvider, ripe_stat::RipeStatProvider,
};
use secrecy::ExposeSecret;
use tracing::{info, warn};
use warehouse_sync::{
    config::EtlConfig,
    countries::resolve_countries,
    db::{bootstrap::ensure_tables, connection::WarehousePool},
    tasks::{EtlTask, RunPlan, TaskRunner},
    telemetry::init_tracing_from_env,
    timeframe::DateResolution,
    tz::parse_date_arg,
};

#[derive(Parser)]
#[command(version, about = "Load country Internet metrics into the warehouse")]
struct Cli {
    /// ASNS, STATS_1D, STATS_5M, ASN_NEIGHBOURS, TRAFFIC or INTERNET_QUALITY
    #[arg(short, long, value_parser = |s: &str| s.parse::<EtlTask>())]
    task: EtlTask,

    /// ISO2 country codes, or `all`
    #[arg(short, long, required = true, num_args = 1..)]
    countries: Vec<String>,

    /// First date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    date_from: NaiveDate,

    /// Last date (inclusive), YYYY-MM-DD
    #[arg(long, value_parser = parse_date_arg)]
    date_to: NaiveDate,

    /// D (daily), W (weekly) or M (monthly)
    #[arg(short = 'r', long, value_parser = |s: &str| s.parse::<DateResolution>())]
    date_resolution: DateResolution,

    /// TOML settings file; environment variables take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save every rendered INSERT to the audit directory
    #[arg(long)]
    save_sql: bool,

    /// Do not write to the warehouse (use with --save-sql for a dry run)
    #[arg(long)]
    no_load: bool,

    /// Create missing tables before loading
    #[arg(long)]
    init_schema: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing_from_env().context("installing the log subscriber")?;

    // all argument validation happens before any I/O
    let countries = resolve_countries(cli.countries.as_slice())?;
    let plan = RunPlan::new(
        cli.task,
        countries,
        cli.date_from,
        cli.date_to,
        cli.date_resolution,
    );
    if plan.task.uses_dates() && plan.dates.is_empty() {
        warn!(
            date_from = %plan.date_from,
            date_to = %plan.date_to,
            resolution = %plan.resolution,
            "no dates in range, nothing to fetch"
        );
    }

    let mut config = EtlConfig::load(cli.config.as_deref())?;
    info!(
        task = %plan.task,
        countries = plan.countries.len(),
        dates = plan.dates.len(),
        database = %config.redacted_database_url(),
        save_sql = cli.save_sql,
        load = !cli.no_load,
        "run configured"
    );

    let pool = WarehousePool::connect(config.database_url.expose_secret(), config.pool)
        .context("opening the warehouse")?;
    if cli.init_schema {
        ensure_tables(&pool)?;
    }

    let registry = RipeStatProvider::new(config.ripe.clone())?;
    let mut runner = TaskRunner::new(
        pool,
        Box::new(registry),
        config.load_options(cli.save_sql, !cli.no_load),
    );
    if plan.task.needs_traffic() {
        let token = config.cloudflare_token.take().context(
            "CLOUDFLARE_API_TOKEN is required for TRAFFIC and INTERNET_QUALITY",
        )?;
        let traffic = CloudflareRadarProvider::new(token, config.cloudflare.clone())?;
        runner = runner.with_traffic(Box::new(traffic));
    }

    let summary = runner.run(&plan).await?;
    info!("run finished\n{summary}");
    Ok(())
}
