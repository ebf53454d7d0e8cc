use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::fixture::Fixture;
use crate::football_data::{self, FixtureQuery};
use crate::history_store::SqliteHistory;
use crate::league::League;
use crate::match_record::{MatchRecord, RawMatchRow, records_from_rows};

/// Where refreshed history and fixtures come from.
pub trait MatchSource: Sync {
    fn finished_matches(&self, league: League) -> Result<Vec<MatchRecord>>;
    fn upcoming_fixtures(&self, league: League) -> Result<Vec<Fixture>>;
    fn live_fixtures(&self, league: League) -> Result<Vec<Fixture>>;
}

pub struct FootballDataSource {
    pub api_key: String,
    pub upcoming_window_days: u32,
}

impl MatchSource for FootballDataSource {
    fn finished_matches(&self, league: League) -> Result<Vec<MatchRecord>> {
        football_data::fetch_finished_matches(league, &self.api_key)
    }

    fn upcoming_fixtures(&self, league: League) -> Result<Vec<Fixture>> {
        let today = Utc::now().date_naive();
        football_data::fetch_fixtures(
            league,
            &self.api_key,
            FixtureQuery::Upcoming {
                today,
                days: self.upcoming_window_days,
            },
        )
    }

    fn live_fixtures(&self, league: League) -> Result<Vec<Fixture>> {
        football_data::fetch_fixtures(league, &self.api_key, FixtureQuery::Live)
    }
}

#[derive(Debug, Clone)]
pub struct LeagueIngestSummary {
    pub league: League,
    pub matches_seen: usize,
    pub matches_appended: usize,
    pub fixtures: usize,
    pub latest_date: Option<NaiveDate>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub matches_seen: usize,
    pub matches_appended: usize,
    pub per_league: Vec<LeagueIngestSummary>,
}

impl IngestSummary {
    pub fn failed(&self) -> impl Iterator<Item = &LeagueIngestSummary> {
        self.per_league.iter().filter(|l| l.error.is_some())
    }
}

/// Pulls finished matches and upcoming fixtures for every league and appends
/// them to the store. Fetches run on a bounded pool; writes are sequential.
/// A failing league is recorded in the summary and does not stop the rest.
pub fn refresh_leagues(
    store: &SqliteHistory,
    source: &dyn MatchSource,
    leagues: &[League],
    parallelism: usize,
) -> IngestSummary {
    let started_at = Utc::now().to_rfc3339();
    let fetched: Vec<(League, Result<Vec<MatchRecord>>, Result<Vec<Fixture>>)> =
        with_fetch_pool(parallelism, || {
            leagues
                .par_iter()
                .map(|league| {
                    (
                        *league,
                        source.finished_matches(*league),
                        source.upcoming_fixtures(*league),
                    )
                })
                .collect()
        });

    let mut summary = IngestSummary::default();
    for (league, matches, fixtures) in fetched {
        let item = store_league(store, league, matches, fixtures);
        if let Err(err) = store.log_ingest_run(
            league,
            &started_at,
            item.matches_seen,
            item.matches_appended,
            item.error.as_deref(),
        ) {
            warn!(league = league.code(), error = %err, "failed to log ingest run");
        }
        summary.matches_seen += item.matches_seen;
        summary.matches_appended += item.matches_appended;
        summary.per_league.push(item);
    }

    info!(
        leagues = leagues.len(),
        seen = summary.matches_seen,
        appended = summary.matches_appended,
        failed = summary.failed().count(),
        "history refresh finished"
    );
    summary
}

fn store_league(
    store: &SqliteHistory,
    league: League,
    matches: Result<Vec<MatchRecord>>,
    fixtures: Result<Vec<Fixture>>,
) -> LeagueIngestSummary {
    let mut item = LeagueIngestSummary {
        league,
        matches_seen: 0,
        matches_appended: 0,
        fixtures: 0,
        latest_date: None,
        error: None,
    };
    let mut errors = Vec::new();

    match matches.and_then(|rows| {
        let appended = store.append(league, &rows)?;
        Ok((rows.len(), appended))
    }) {
        Ok((seen, appended)) => {
            item.matches_seen = seen;
            item.matches_appended = appended;
        }
        Err(err) => errors.push(format!("history: {err:#}")),
    }

    // Finished matches are worth keeping even when the fixture call fails.
    match fixtures.and_then(|list| {
        store.replace_fixtures(league, &list)?;
        Ok(list.len())
    }) {
        Ok(n) => item.fixtures = n,
        Err(err) => errors.push(format!("fixtures: {err:#}")),
    }

    item.latest_date = store.latest_date(league).ok().flatten();
    if !errors.is_empty() {
        warn!(league = league.code(), errors = ?errors, "league refresh incomplete");
        item.error = Some(errors.join("; "));
    }
    item
}

/// Loads a JSON array of raw history rows (dates as `DD/MM/YYYY`) into the
/// store. One malformed row rejects the whole batch.
pub fn import_rows_json(store: &SqliteHistory, league: League, raw: &str) -> Result<usize> {
    let rows: Vec<RawMatchRow> = serde_json::from_str(raw).context("invalid history row json")?;
    let records = records_from_rows(&rows).map_err(|(idx, err)| anyhow!("row {idx}: {err}"))?;
    let appended = store.append(league, &records)?;
    info!(
        league = league.code(),
        rows = rows.len(),
        appended,
        "history rows imported"
    );
    Ok(appended)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, 8))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
