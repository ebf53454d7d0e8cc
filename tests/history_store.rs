use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use h2h_terminal::history_store::{
    CachedHistoryStore, MatchHistoryStore, SqliteHistory, StaticHistory,
};
use h2h_terminal::league::League;
use h2h_terminal::match_record::MatchRecord;

fn rec(home: &str, away: &str, day: u32) -> MatchRecord {
    let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
    MatchRecord::try_new(home, away, (1, 2), (0, 1), date).unwrap()
}

struct CountingStore {
    inner: StaticHistory,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new(inner: StaticHistory) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MatchHistoryStore for CountingStore {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(league)
    }
}

struct FailingStore;

impl MatchHistoryStore for FailingStore {
    fn get(&self, league: League) -> Result<Vec<MatchRecord>> {
        Err(anyhow!("upstream down for {}", league.code()))
    }
}

#[test]
fn cache_serves_repeat_reads_within_ttl() {
    let inner = Arc::new(CountingStore::new(
        StaticHistory::new().with_league(League::SerieA, vec![rec("Inter", "Milan", 3)]),
    ));
    let cache = CachedHistoryStore::new(Arc::clone(&inner), Duration::from_secs(3600));

    assert_eq!(cache.get(League::SerieA).unwrap().len(), 1);
    assert_eq!(cache.get(League::SerieA).unwrap().len(), 1);
    assert_eq!(inner.calls(), 1);

    cache.invalidate(League::SerieA);
    cache.get(League::SerieA).unwrap();
    assert_eq!(inner.calls(), 2);

    cache.invalidate_all();
    cache.get(League::SerieA).unwrap();
    assert_eq!(inner.calls(), 3);
}

#[test]
fn zero_ttl_always_reads_through() {
    let inner = Arc::new(CountingStore::new(
        StaticHistory::new().with_league(League::Ligue1, vec![rec("PSG", "Lyon", 4)]),
    ));
    let cache = CachedHistoryStore::new(Arc::clone(&inner), Duration::ZERO);
    cache.get(League::Ligue1).unwrap();
    cache.get(League::Ligue1).unwrap();
    assert_eq!(inner.calls(), 2);
}

#[test]
fn failures_surface_and_are_not_cached() {
    let inner = Arc::new(CountingStore::new(StaticHistory::new()));
    let cache = CachedHistoryStore::new(Arc::clone(&inner), Duration::from_secs(3600));
    assert!(cache.get(League::Bundesliga).is_err());
    assert!(cache.get(League::Bundesliga).is_err());
    assert_eq!(inner.calls(), 2);

    let failing = CachedHistoryStore::new(FailingStore, Duration::from_secs(60));
    let failed = failing.warm(&[League::LaLiga, League::PrimeiraLiga]);
    assert_eq!(failed.len(), 2);
    assert!(failed[0].1.to_string().contains("PD"));
}

#[test]
fn warm_preloads_known_leagues() {
    let inner = Arc::new(CountingStore::new(
        StaticHistory::new()
            .with_league(League::Eredivisie, vec![rec("PSV", "Ajax", 1)])
            .with_league(League::PremierLeague, Vec::new()),
    ));
    let cache = CachedHistoryStore::new(Arc::clone(&inner), Duration::from_secs(3600));
    let failed = cache.warm(&[League::Eredivisie, League::PremierLeague, League::SerieA]);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, League::SerieA);

    cache.get(League::Eredivisie).unwrap();
    cache.get(League::PremierLeague).unwrap();
    assert_eq!(inner.calls(), 3);
}

#[test]
fn sqlite_history_reads_back_in_date_order() {
    let store = SqliteHistory::open_in_memory().unwrap();
    store
        .append(League::Championship, &[rec("Leeds", "Burnley", 20), rec("Norwich", "Leeds", 5)])
        .unwrap();
    assert_eq!(store.append(League::Championship, &[rec("Leeds", "Burnley", 20)]).unwrap(), 0);

    let cached = CachedHistoryStore::new(store, Duration::from_secs(60));
    let rows = cached.get(League::Championship).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].home_team, "Norwich");
    assert!(cached.get(League::Brasileirao).unwrap().is_empty());
    assert_eq!(cached.inner().count(League::Championship).unwrap(), 2);
}
