//! Named ETL tasks and the runner that drives them over countries and dates.
//!
//! | task | fetches | dates |
//! |---|---|---|
//! | `ASNS` | one ASN inventory per (country, date) | planned dates |
//! | `STATS_1D` | one daily statistics range per date (start = end) | planned dates |
//! | `STATS_5M` | one five-minute statistics range per calendar year | years of the planned dates |
//! | `ASN_NEIGHBOURS` | ASN inventory, then neighbours of every ASN | planned dates |
//! | `TRAFFIC` | one trailing 52-week traffic series | ignored |
//! | `INTERNET_QUALITY` | one trailing 52-week bandwidth series | ignored |
//!
//! Countries run one after another and the first failure aborts the run.

use std::{collections::BTreeSet, fmt, str::FromStr, time::Instant};

use chrono::{Datelike, NaiveDate};
use metrics_ingestor::{
    models::registry::StatsResolution,
    providers::{RegistryProvider, TrafficProvider},
};
use tracing::{info, info_span, Instrument};

use crate::{
    countries::country_name,
    db::connection::WarehousePool,
    domains::{
        CountryScope,
        asn::{self, AsnInventory},
        country_stat::{self, CountryStats, StatScope},
        neighbour::{self, AsnNeighbours},
        quality::{self, InternetQuality},
        traffic::{self, CountryTraffic},
    },
    error::EtlError,
    sync::{LoadOptions, SyncReport, sync_rows},
    timeframe::{DateResolution, plan_dates},
};

/// Registry client as held by the runner.
pub type DynRegistry = Box<dyn RegistryProvider + Send + Sync>;
/// Traffic client as held by the runner.
pub type DynTraffic = Box<dyn TrafficProvider + Send + Sync>;

/// One of the six load tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EtlTask {
    /// ASN inventory.
    Asns,
    /// Daily routing statistics.
    Stats1d,
    /// Five-minute routing statistics.
    Stats5m,
    /// ASN adjacency.
    AsnNeighbours,
    /// Traffic volume.
    Traffic,
    /// Bandwidth percentiles.
    InternetQuality,
}

impl EtlTask {
    /// Every task, in CLI help order.
    pub const ALL: [EtlTask; 6] = [
        EtlTask::Asns,
        EtlTask::Stats1d,
        EtlTask::Stats5m,
        EtlTask::AsnNeighbours,
        EtlTask::Traffic,
        EtlTask::InternetQuality,
    ];

    /// CLI name.
    pub const fn as_str(self) -> &'static str {
        match self {
            EtlTask::Asns => "ASNS",
            EtlTask::Stats1d => "STATS_1D",
            EtlTask::Stats5m => "STATS_5M",
            EtlTask::AsnNeighbours => "ASN_NEIGHBOURS",
            EtlTask::Traffic => "TRAFFIC",
            EtlTask::InternetQuality => "INTERNET_QUALITY",
        }
    }

    /// False for tasks that always load a trailing window.
    pub const fn uses_dates(self) -> bool {
        !self.needs_traffic()
    }

    /// True for tasks served by the traffic provider.
    pub const fn needs_traffic(self) -> bool {
        matches!(self, EtlTask::Traffic | EtlTask::InternetQuality)
    }
}

impl fmt::Display for EtlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EtlTask {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EtlTask::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EtlError::UnknownTask(wanted.to_string()))
    }
}

/// A validated run: task, countries, and the planned dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Task to run.
    pub task: EtlTask,
    /// Resolved country codes, in run order.
    pub countries: Vec<&'static str>,
    /// Requested range start (inclusive).
    pub date_from: NaiveDate,
    /// Requested range end (inclusive).
    pub date_to: NaiveDate,
    /// Step between planned dates.
    pub resolution: DateResolution,
    /// Output of the planner for the range.
    pub dates: Vec<NaiveDate>,
}

impl RunPlan {
    /// Plans the dates for `[date_from, date_to]`.
    pub fn new(
        task: EtlTask,
        countries: Vec<&'static str>,
        date_from: NaiveDate,
        date_to: NaiveDate,
        resolution: DateResolution,
    ) -> Self {
        Self {
            task,
            countries,
            date_from,
            date_to,
            resolution,
            dates: plan_dates(date_from, date_to, resolution),
        }
    }
}

/// Per-country pipeline reports of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Task that ran.
    pub task: Option<EtlTask>,
    /// `(country, report)` in run order.
    pub countries: Vec<(&'static str, SyncReport)>,
}

impl RunSummary {
    /// Sum over all countries.
    pub fn total(&self) -> SyncReport {
        let mut total = SyncReport::default();
        for (_, report) in &self.countries {
            total += report.clone();
        }
        total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(task) = self.task {
            writeln!(f, "{task}")?;
        }
        for (country, report) in &self.countries {
            writeln!(f, "  {country}: {report}")?;
        }
        write!(f, "  total: {}", self.total())
    }
}

/// Runs tasks against one warehouse with one set of providers.
pub struct TaskRunner {
    pool: WarehousePool,
    registry: DynRegistry,
    traffic: Option<DynTraffic>,
    options: LoadOptions,
}

impl TaskRunner {
    /// Runner without a traffic provider; traffic tasks fail with a
    /// configuration error.
    pub fn new(pool: WarehousePool, registry: DynRegistry, options: LoadOptions) -> Self {
        Self {
            pool,
            registry,
            traffic: None,
            options,
        }
    }

    /// Adds the traffic provider.
    pub fn with_traffic(mut self, traffic: DynTraffic) -> Self {
        self.traffic = Some(traffic);
        self
    }

    /// Load switches in effect.
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Runs `plan.task` for every country in order.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunSummary, EtlError> {
        if plan.task.needs_traffic() && self.traffic.is_none() {
            return Err(EtlError::Config(format!(
                "task {} needs a traffic API token",
                plan.task
            )));
        }

        let mut summary = RunSummary {
            task: Some(plan.task),
            countries: Vec::with_capacity(plan.countries.len()),
        };
        for &country in &plan.countries {
            let span = info_span!("country", task = %plan.task, country);
            let report = self.run_country(plan, country).instrument(span).await?;
            summary.countries.push((country, report));
        }
        Ok(summary)
    }

    async fn run_country(&self, plan: &RunPlan, country: &str) -> Result<SyncReport, EtlError> {
        let started = Instant::now();
        info!(
            name = country_name(country).unwrap_or(country),
            date_from = %plan.date_from,
            date_to = %plan.date_to,
            resolution = plan.resolution.describe(),
            dates = plan.dates.len(),
            "started"
        );

        let report = match plan.task {
            EtlTask::Asns => self.load_asns(country, &plan.dates).await?,
            EtlTask::Stats1d => self.load_daily_stats(country, &plan.dates).await?,
            EtlTask::Stats5m => self.load_five_minute_stats(country, &plan.dates).await?,
            EtlTask::AsnNeighbours => self.load_neighbours(country, &plan.dates).await?,
            EtlTask::Traffic => self.load_traffic(country).await?,
            EtlTask::InternetQuality => self.load_quality(country).await?,
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            new = report.new_rows,
            inserted = report.inserted,
            "finished"
        );
        Ok(report)
    }

    async fn load_asns(&self, country: &str, dates: &[NaiveDate]) -> Result<SyncReport, EtlError> {
        let scope = CountryScope::new(country);
        let mut report = SyncReport::default();
        for &date in dates {
            let asns = self.registry.country_asns(country, date).await?;
            info!(%date, routed = asns.routed.len(), non_routed = asns.non_routed.len(), "ASNs fetched");
            let rows = asn::records_from(country, date, &asns);
            report += sync_rows::<AsnInventory>(&self.pool, &scope, rows, &self.options)?;
        }
        Ok(report)
    }

    async fn load_daily_stats(
        &self,
        country: &str,
        dates: &[NaiveDate],
    ) -> Result<SyncReport, EtlError> {
        let mut report = SyncReport::default();
        for &date in dates {
            report += self
                .load_stats(country, StatsResolution::Daily, date, date)
                .await?;
        }
        Ok(report)
    }

    async fn load_five_minute_stats(
        &self,
        country: &str,
        dates: &[NaiveDate],
    ) -> Result<SyncReport, EtlError> {
        let years: BTreeSet<i32> = dates.iter().map(|d| d.year()).collect();
        let mut report = SyncReport::default();
        for year in years {
            let (Some(from), Some(to)) = (
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year + 1, 1, 1),
            ) else {
                continue;
            };
            report += self
                .load_stats(country, StatsResolution::FiveMinute, from, to)
                .await?;
        }
        Ok(report)
    }

    async fn load_stats(
        &self,
        country: &str,
        resolution: StatsResolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<SyncReport, EtlError> {
        let entries = self
            .registry
            .country_resource_stats(country, resolution, from, to)
            .await?;
        info!(%resolution, %from, %to, records = entries.len(), "statistics fetched");

        let rows = country_stat::stats_from(country, resolution, &entries)?;
        let scope = StatScope {
            country_iso2: country.to_string(),
            resolution,
        };
        sync_rows::<CountryStats>(&self.pool, &scope, rows, &self.options)
    }

    async fn load_neighbours(
        &self,
        country: &str,
        dates: &[NaiveDate],
    ) -> Result<SyncReport, EtlError> {
        let scope = CountryScope::new(country);
        let mut report = SyncReport::default();
        for &date in dates {
            let asns = self.registry.country_asns(country, date).await?;
            let total = asns.len();
            info!(%date, asns = total, "fetching neighbours");

            let mut edges = Vec::new();
            for (i, asn) in asns.all().enumerate() {
                let neighbours = self.registry.asn_neighbours(asn, date).await?;
                info!(progress = %format!("{}/{total}", i + 1), asn, neighbours = neighbours.len(), "neighbours fetched");
                edges.extend(neighbour::edges_from(asn, date, &neighbours));
            }
            report += sync_rows::<AsnNeighbours>(&self.pool, &scope, edges, &self.options)?;
        }
        Ok(report)
    }

    fn traffic_provider(&self) -> Result<&DynTraffic, EtlError> {
        self.traffic
            .as_ref()
            .ok_or_else(|| EtlError::Config("traffic provider not configured".into()))
    }

    async fn load_traffic(&self, country: &str) -> Result<SyncReport, EtlError> {
        let series = self.traffic_provider()?.traffic(country).await?;
        info!(records = series.timestamps.len(), "traffic fetched");
        let rows = traffic::samples_from(country, &series)?;
        sync_rows::<CountryTraffic>(&self.pool, &CountryScope::new(country), rows, &self.options)
    }

    async fn load_quality(&self, country: &str) -> Result<SyncReport, EtlError> {
        let series = self.traffic_provider()?.internet_quality(country).await?;
        info!(records = series.timestamps.len(), "internet quality fetched");
        let rows = quality::samples_from(country, &series)?;
        sync_rows::<InternetQuality>(&self.pool, &CountryScope::new(country), rows, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_names_parse_case_insensitively() {
        assert_eq!("asns".parse::<EtlTask>().unwrap(), EtlTask::Asns);
        assert_eq!("Stats_5m".parse::<EtlTask>().unwrap(), EtlTask::Stats5m);
        for task in EtlTask::ALL {
            assert_eq!(task.to_string().parse::<EtlTask>().unwrap(), task);
        }
        assert!(matches!(
            "stats".parse::<EtlTask>(),
            Err(EtlError::UnknownTask(t)) if t == "stats"
        ));
    }

    #[test]
    fn only_traffic_tasks_ignore_dates() {
        let ignoring: Vec<_> = EtlTask::ALL.into_iter().filter(|t| !t.uses_dates()).collect();
        assert_eq!(ignoring, vec![EtlTask::Traffic, EtlTask::InternetQuality]);
    }

    #[test]
    fn plan_expands_dates() {
        let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day).unwrap();
        let plan = RunPlan::new(EtlTask::Asns, vec!["US"], d(1, 3), d(1, 20), DateResolution::Week);
        assert_eq!(plan.dates, vec![d(1, 9), d(1, 16)]);
    }
}
