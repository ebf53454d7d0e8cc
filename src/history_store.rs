use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::fixture::{Fixture, FixtureStatus};
use crate::http_cache::app_cache_dir;
use crate::league::League;
use crate::match_record::MatchRecord;

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of a league's finished-match history.
///
/// Implementations fail explicitly when the history cannot be produced; they
/// never hand back partial rows in place of an error.
pub trait MatchHistoryStore: Send + Sync {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>>;
}

impl<S: MatchHistoryStore + ?Sized> MatchHistoryStore for Arc<S> {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        (**self).get(league)
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("match_history.sqlite"))
}

/// Append-only sqlite history, deduplicated on (league, home, away, date).
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    /// Inserts records not yet stored and returns how many were new.
    pub fn append(&self, league: League, records: &[MatchRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().context("begin append transaction")?;
        let ingested_at = Utc::now().to_rfc3339();
        let mut appended = 0usize;
        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT OR IGNORE INTO matches (
                        league, home_team, away_team, match_date,
                        goals_home_full, goals_away_full,
                        goals_home_first_half, goals_away_first_half,
                        ingested_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .context("prepare append")?;
            for m in records {
                appended += stmt
                    .execute(params![
                        league.code(),
                        m.home_team,
                        m.away_team,
                        m.date.format(ISO_DATE).to_string(),
                        m.goals_home_full,
                        m.goals_away_full,
                        m.goals_home_first_half,
                        m.goals_away_first_half,
                        ingested_at,
                    ])
                    .context("append match")?;
            }
        }
        tx.commit().context("commit append transaction")?;
        debug!(league = league.code(), seen = records.len(), appended, "appended history");
        Ok(appended)
    }

    pub fn latest_date(&self, league: League) -> Result<Option<NaiveDate>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT MAX(match_date) FROM matches WHERE league = ?1",
                params![league.code()],
                |row| row.get::<_, Option<String>>(0),
            )
            .context("query latest match date")?;
        raw.map(|s| parse_iso_date(&s)).transpose()
    }

    pub fn count(&self, league: League) -> Result<usize> {
        let conn = self.lock()?;
        let n = conn
            .query_row(
                "SELECT COUNT(*) FROM matches WHERE league = ?1",
                params![league.code()],
                |row| row.get::<_, i64>(0),
            )
            .context("count matches")?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Replaces the stored upcoming/live fixture list for one league.
    pub fn replace_fixtures(&self, league: League, fixtures: &[Fixture]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().context("begin fixtures transaction")?;
        tx.execute("DELETE FROM fixtures WHERE league = ?1", params![league.code()])
            .context("clear fixtures")?;
        for f in fixtures {
            let (score_home, score_away) = match f.score {
                Some((h, a)) => (Some(h), Some(a)),
                None => (None, None),
            };
            tx.execute(
                r#"
                INSERT OR REPLACE INTO fixtures (
                    league, fixture_id, home_team, away_team, kickoff, status, score_home, score_away
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    league.code(),
                    f.id as i64,
                    f.home,
                    f.away,
                    f.kickoff.format(ISO_DATETIME).to_string(),
                    f.status.api_code(),
                    score_home,
                    score_away,
                ],
            )
            .context("insert fixture")?;
        }
        tx.commit().context("commit fixtures transaction")?;
        Ok(())
    }

    pub fn load_fixtures(&self, league: League) -> Result<Vec<Fixture>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT fixture_id, home_team, away_team, kickoff, status, score_home, score_away
                FROM fixtures
                WHERE league = ?1
                ORDER BY kickoff ASC, fixture_id ASC
                "#,
            )
            .context("prepare load fixtures")?;
        let rows = stmt
            .query_map(params![league.code()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<u32>>(5)?,
                    row.get::<_, Option<u32>>(6)?,
                ))
            })
            .context("query fixtures")?;

        let mut out = Vec::new();
        for row in rows {
            let (id, home, away, kickoff, status, sh, sa) = row.context("decode fixture row")?;
            let kickoff = NaiveDateTime::parse_from_str(&kickoff, ISO_DATETIME)
                .with_context(|| format!("bad stored kickoff {kickoff:?}"))?;
            out.push(Fixture {
                id: u64::try_from(id).unwrap_or_default(),
                league,
                home,
                away,
                kickoff,
                status: FixtureStatus::from_api(&status),
                score: sh.zip(sa),
            });
        }
        Ok(out)
    }

    pub fn log_ingest_run(
        &self,
        league: League,
        started_at: &str,
        matches_seen: usize,
        matches_appended: usize,
        error: Option<&str>,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO ingest_runs(started_at, finished_at, league, matches_seen, matches_appended, error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                started_at,
                Utc::now().to_rfc3339(),
                league.code(),
                matches_seen as i64,
                matches_appended as i64,
                error,
            ],
        )
        .context("insert ingest run")?;
        Ok(())
    }
}

impl MatchHistoryStore for SqliteHistory {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT home_team, away_team, match_date,
                       goals_home_full, goals_away_full,
                       goals_home_first_half, goals_away_first_half
                FROM matches
                WHERE league = ?1
                ORDER BY match_date ASC, id ASC
                "#,
            )
            .context("prepare load history")?;
        let rows = stmt
            .query_map(params![league.code()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, u32>(6)?,
                ))
            })
            .context("query history")?;

        let mut out = Vec::new();
        for row in rows {
            let (home, away, date, gh, ga, gh1, ga1) = row.context("decode history row")?;
            let date = parse_iso_date(&date)?;
            let record = MatchRecord::try_new(home, away, (gh, ga), (gh1, ga1), date)
                .context("stored row violates match contract")?;
            out.push(record);
        }
        Ok(out)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            league TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            match_date TEXT NOT NULL,
            goals_home_full INTEGER NOT NULL,
            goals_away_full INTEGER NOT NULL,
            goals_home_first_half INTEGER NOT NULL,
            goals_away_first_half INTEGER NOT NULL,
            ingested_at TEXT NOT NULL,
            UNIQUE(league, home_team, away_team, match_date)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_league_date ON matches(league, match_date);

        CREATE TABLE IF NOT EXISTS fixtures (
            league TEXT NOT NULL,
            fixture_id INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            kickoff TEXT NOT NULL,
            status TEXT NOT NULL,
            score_home INTEGER NULL,
            score_away INTEGER NULL,
            PRIMARY KEY (league, fixture_id)
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            league TEXT NOT NULL,
            matches_seen INTEGER NOT NULL,
            matches_appended INTEGER NOT NULL,
            error TEXT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, ISO_DATE).with_context(|| format!("bad stored date {raw:?}"))
}

/// In-memory history keyed by league. Unknown leagues are an error.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    leagues: HashMap<League, Vec<MatchRecord>>,
}

impl StaticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_league(mut self, league: League, rows: Vec<MatchRecord>) -> Self {
        self.leagues.insert(league, rows);
        self
    }

    pub fn insert(&mut self, league: League, rows: Vec<MatchRecord>) {
        self.leagues.insert(league, rows);
    }
}

impl MatchHistoryStore for StaticHistory {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        self.leagues
            .get(&league)
            .cloned()
            .ok_or_else(|| anyhow!("no history for league {}", league.code()))
    }
}

struct CacheSlot {
    rows: Vec<MatchRecord>,
    fetched_at: Instant,
}

/// Per-league read-through cache in front of another store.
pub struct CachedHistoryStore<S> {
    inner: S,
    ttl: Duration,
    slots: Mutex<HashMap<League, CacheSlot>>,
}

impl<S: MatchHistoryStore> CachedHistoryStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn invalidate(&self, league: League) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(&league);
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.clear();
        }
    }

    /// Loads every league up front; returns the leagues that failed.
    pub fn warm(&self, leagues: &[League]) -> Vec<(League, anyhow::Error)> {
        let mut failed = Vec::new();
        for league in leagues {
            if let Err(err) = self.get(*league) {
                failed.push((*league, err));
            }
        }
        info!(
            leagues = leagues.len(),
            failed = failed.len(),
            "history cache warmed"
        );
        failed
    }

    fn fresh_rows(&self, league: League) -> Result<Option<Vec<MatchRecord>>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("history cache lock poisoned"))?;
        Ok(slots
            .get(&league)
            .filter(|slot| slot.fetched_at.elapsed() < self.ttl)
            .map(|slot| slot.rows.clone()))
    }
}

impl<S: MatchHistoryStore> MatchHistoryStore for CachedHistoryStore<S> {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        if let Some(rows) = self.fresh_rows(league)? {
            return Ok(rows);
        }
        // Fetch outside the lock so one slow league does not block the others.
        let rows = self.inner.get(league)?;
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow!("history cache lock poisoned"))?;
        slots.insert(
            league,
            CacheSlot {
                rows: rows.clone(),
                fetched_at: Instant::now(),
            },
        );
        debug!(league = league.code(), rows = rows.len(), "history cache refreshed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(home: &str, away: &str, day: u32) -> MatchRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        MatchRecord::try_new(home, away, (2, 1), (1, 0), date).unwrap()
    }

    #[test]
    fn sqlite_append_is_idempotent_on_the_dedup_key() {
        let store = SqliteHistory::open_in_memory().unwrap();
        let rows = vec![rec("A", "B", 2), rec("C", "A", 1)];
        assert_eq!(store.append(League::SerieA, &rows).unwrap(), 2);
        assert_eq!(store.append(League::SerieA, &rows).unwrap(), 0);
        assert_eq!(store.count(League::SerieA).unwrap(), 2);

        let loaded = store.get(League::SerieA).unwrap();
        assert_eq!(loaded, vec![rec("C", "A", 1), rec("A", "B", 2)]);
        assert_eq!(
            store.latest_date(League::SerieA).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
        assert!(store.get(League::Ligue1).unwrap().is_empty());
        assert_eq!(store.latest_date(League::Ligue1).unwrap(), None);
    }

    #[test]
    fn static_history_rejects_unknown_league() {
        let store = StaticHistory::new().with_league(League::LaLiga, vec![rec("A", "B", 1)]);
        assert_eq!(store.get(League::LaLiga).unwrap().len(), 1);
        assert!(store.get(League::Eredivisie).is_err());
    }
}
