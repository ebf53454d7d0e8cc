use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::demo_feed::DemoSource;
use crate::fixture::Fixture;
use crate::history_store::{CachedHistoryStore, MatchHistoryStore, SqliteHistory};
use crate::ingest::{FootballDataSource, MatchSource, refresh_leagues};
use crate::league::League;
use crate::report::{MatchupPreset, MatchupReport};
use crate::state::{Delta, FixtureView, ProviderCommand};
use crate::stats_export::export_matchup;

const DEMO_SEED: u64 = 2024;

/// Owns the history store and the upstream source; turns commands into deltas.
pub struct Provider {
    sqlite: Arc<SqliteHistory>,
    history: CachedHistoryStore<Arc<SqliteHistory>>,
    source: Box<dyn MatchSource + Send>,
    leagues: Vec<League>,
    parallelism: usize,
}

impl Provider {
    pub fn new(
        sqlite: SqliteHistory,
        source: Box<dyn MatchSource + Send>,
        leagues: Vec<League>,
        cache_ttl: Duration,
        parallelism: usize,
    ) -> Self {
        let sqlite = Arc::new(sqlite);
        Self {
            history: CachedHistoryStore::new(Arc::clone(&sqlite), cache_ttl),
            sqlite,
            source,
            leagues,
            parallelism,
        }
    }

    /// Demo mode keeps everything in memory so the real database stays untouched.
    pub fn from_config(config: &Config) -> Result<Self> {
        let live_key = config.live_api_key();
        let (sqlite, source): (SqliteHistory, Box<dyn MatchSource + Send>) = match live_key {
            Some(key) => {
                let sqlite = match &config.db_path {
                    Some(path) => SqliteHistory::open(path)?,
                    None => {
                        warn!("no cache dir for the history database; using memory");
                        SqliteHistory::open_in_memory()?
                    }
                };
                let source: Box<dyn MatchSource + Send> = Box::new(FootballDataSource {
                    api_key: key.to_string(),
                    upcoming_window_days: config.upcoming_window_days,
                });
                (sqlite, source)
            }
            None => {
                let source: Box<dyn MatchSource + Send> = Box::new(DemoSource::new(DEMO_SEED));
                (SqliteHistory::open_in_memory()?, source)
            }
        };
        Ok(Self::new(
            sqlite,
            source,
            config.leagues.clone(),
            config.history_cache_ttl,
            config.fetch_parallelism,
        ))
    }

    pub fn refresh(&self) -> Vec<Delta> {
        let summary = refresh_leagues(&self.sqlite, &*self.source, &self.leagues, self.parallelism);
        self.history.invalidate_all();

        let mut deltas = vec![Delta::Log(format!(
            "[INFO] History refreshed: {} new of {} matches across {} leagues",
            summary.matches_appended,
            summary.matches_seen,
            summary.per_league.len()
        ))];
        for failed in summary.failed() {
            deltas.push(Delta::Log(format!(
                "[WARN] {}: {}",
                failed.league.code(),
                failed.error.as_deref().unwrap_or("unknown error")
            )));
        }
        deltas
    }

    pub fn handle(&self, cmd: ProviderCommand) -> Vec<Delta> {
        match cmd {
            ProviderCommand::FetchFixtures { league, view } => vec![self.fixtures(league, view)],
            ProviderCommand::BuildReport {
                league,
                home,
                away,
                preset,
            } => vec![self.report(league, &home, &away, &preset)],
            ProviderCommand::RefreshHistory => self.refresh(),
            ProviderCommand::ExportReport { path, report } => {
                vec![export_delta(Path::new(&path), &report)]
            }
        }
    }

    fn fixtures(&self, league: League, view: FixtureView) -> Delta {
        let fetched = match view {
            FixtureView::Upcoming => self.source.upcoming_fixtures(league).or_else(|err| {
                warn!(league = league.code(), error = %err, "upcoming fetch failed; using stored fixtures");
                self.sqlite
                    .load_fixtures(league)
                    .map(|list| list.into_iter().filter(Fixture::is_upcoming).collect())
            }),
            FixtureView::Live => self.source.live_fixtures(league),
        };
        match fetched {
            Ok(fixtures) => Delta::SetFixtures {
                league,
                view,
                fixtures,
            },
            Err(err) => Delta::FixturesFailed {
                league,
                error: format!("{err:#}"),
            },
        }
    }

    fn report(&self, league: League, home: &str, away: &str, preset: &MatchupPreset) -> Delta {
        match self.history.get(league) {
            Ok(history) => Delta::SetReport(Box::new(MatchupReport::compute(
                league, &history, home, away, preset,
            ))),
            Err(err) => Delta::ReportFailed {
                league,
                home: home.to_string(),
                away: away.to_string(),
                preset: preset.clone(),
                error: format!("{err:#}"),
            },
        }
    }
}

fn export_delta(path: &Path, report: &MatchupReport) -> Delta {
    match export_matchup(path, report).context("export failed") {
        Ok(done) => Delta::Log(format!(
            "[INFO] Exported {} summary rows and {} recent rows to {}",
            done.summary_rows,
            done.recent_rows,
            path.display()
        )),
        Err(err) => Delta::Log(format!("[WARN] {err:#}")),
    }
}

/// Runs the provider on its own thread: an initial refresh, then commands,
/// then a full refresh every `refresh_interval`.
pub fn spawn_provider(
    provider: Provider,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    refresh_interval: Duration,
) {
    thread::spawn(move || {
        let send_all = |deltas: Vec<Delta>| deltas.into_iter().all(|d| tx.send(d).is_ok());

        if !send_all(provider.refresh()) {
            return;
        }
        let failed = provider.history.warm(&provider.leagues);
        for (league, err) in failed {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] {} history unavailable: {err:#}",
                league.code()
            )));
        }
        let mut last_refresh = Instant::now();

        loop {
            thread::sleep(Duration::from_millis(250));

            loop {
                let cmd = match cmd_rx.try_recv() {
                    Ok(cmd) => cmd,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                };
                if matches!(cmd, ProviderCommand::RefreshHistory) {
                    last_refresh = Instant::now();
                }
                if !send_all(provider.handle(cmd)) {
                    return;
                }
            }

            if last_refresh.elapsed() >= refresh_interval {
                info!("periodic history refresh");
                if !send_all(provider.refresh()) {
                    return;
                }
                last_refresh = Instant::now();
            }
        }
    });
}
