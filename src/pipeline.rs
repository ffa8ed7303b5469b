use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, expand_endpoint};
use crate::error::{Diagnostic, SourceError};
use crate::reconcile::{MissingFields, reconcile};
use crate::resolver::{Resolution, ResolvedFrom, Resolver};
use crate::schedule::{ScheduleFetch, fetch_schedule};
use crate::scoring::{ScoredGameRow, score_slate};
use crate::snapshot_cache::SnapshotStore;
use crate::sources::{Location, StatSource, TabularSource};
use crate::stats::{StatFamily, StatTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySummary {
    pub family: StatFamily,
    pub from: ResolvedFrom,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub rows: Vec<ScoredGameRow>,
    pub missing: Vec<MissingFields>,
    pub diagnostics: Vec<Diagnostic>,
    pub families: Vec<FamilySummary>,
}

impl DailyReport {
    pub fn scored_games(&self) -> usize {
        self.rows.iter().filter(|r| r.is_scored()).count()
    }
}

pub fn season_for(cfg: &PipelineConfig, date: NaiveDate) -> i32 {
    cfg.sources.season.unwrap_or_else(|| date.year())
}

pub fn run(cfg: &PipelineConfig, client: &Client, date: NaiveDate) -> DailyReport {
    let season = season_for(cfg, date);
    let schedule_source = expand_endpoint(&cfg.sources.schedule, season, date);
    let resolvers = build_resolvers(cfg, client, date);

    let (schedule, resolutions) = rayon::join(
        || load_schedule(client, &schedule_source, cfg.cache.offline),
        || resolve_all(&resolvers),
    );
    assemble(cfg, date, schedule, resolutions)
}

fn load_schedule(client: &Client, source: &str, offline: bool) -> ScheduleFetch {
    if source.trim().is_empty() {
        return ScheduleFetch::unavailable(source, &SourceError::NotConfigured);
    }
    if offline && matches!(Location::parse(source), Location::Url(_)) {
        warn!(source, "offline, schedule feed skipped");
        return ScheduleFetch::unavailable(source, &SourceError::Offline);
    }
    fetch_schedule(client, source)
}

pub fn build_resolvers(cfg: &PipelineConfig, client: &Client, date: NaiveDate) -> Vec<Resolver> {
    let season = season_for(cfg, date);
    let store = cfg.cache.resolved_dir().map(SnapshotStore::new);
    if store.is_none() {
        warn!("no cache directory resolved, snapshots disabled");
    }
    let freshness =
        Duration::try_from_secs_f64(cfg.cache.freshness_hours * 3600.0).unwrap_or(Duration::ZERO);

    let source = |family: StatFamily, raw: &str| -> Box<dyn StatSource> {
        let location = Location::parse(&expand_endpoint(raw, season, date));
        Box::new(TabularSource::new(family, location, season, client.clone()))
    };

    StatFamily::ALL
        .iter()
        .map(|&family| {
            let endpoint = cfg.sources.endpoint(family);
            let mut resolver = Resolver::new(family, season).offline(cfg.cache.offline);
            if let Some(store) = &store {
                resolver = resolver.with_cache(store.clone(), freshness);
            }
            if let Some(primary) = endpoint.primary.as_deref().filter(|s| !s.trim().is_empty()) {
                resolver = resolver.with_primary(source(family, primary));
            }
            if let Some(fallback) = endpoint.fallback.as_deref().filter(|s| !s.trim().is_empty()) {
                resolver = resolver.with_fallback(source(family, fallback));
            }
            resolver
        })
        .collect()
}

pub fn resolve_all(resolvers: &[Resolver]) -> Vec<Resolution> {
    resolvers.par_iter().map(Resolver::resolve).collect()
}

pub fn assemble(
    cfg: &PipelineConfig,
    date: NaiveDate,
    schedule: ScheduleFetch,
    resolutions: Vec<Resolution>,
) -> DailyReport {
    let mut diagnostics = schedule.diagnostics;
    let mut families = Vec::with_capacity(resolutions.len());
    let mut team_tables = Vec::new();
    let mut pitcher_tables = Vec::new();

    for res in resolutions {
        families.push(FamilySummary {
            family: res.family,
            from: res.from,
            rows: res.table.len(),
        });
        diagnostics.extend(res.diagnostics);
        match res.table {
            StatTable::Team(t) => team_tables.push(t),
            StatTable::Pitcher(p) => pitcher_tables.push(p),
        }
    }

    let reconciled = reconcile(&schedule.games, &team_tables, &pitcher_tables);
    diagnostics.extend(reconciled.diagnostics);
    let (rows, incomplete) = score_slate(reconciled.rows, cfg);
    diagnostics.extend(incomplete);

    for d in &diagnostics {
        debug!(diagnostic = %d);
    }
    let report = DailyReport {
        date,
        rows,
        missing: reconciled.missing,
        diagnostics,
        families,
    };
    info!(
        %date,
        games = report.rows.len(),
        scored = report.scored_games(),
        diagnostics = report.diagnostics.len(),
        "daily model computed"
    );
    report
}
