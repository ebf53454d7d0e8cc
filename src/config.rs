use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::history_store;
use crate::league::{League, parse_league_codes};

pub const DEFAULT_RECENT_WINDOW: usize = 10;
pub const DEFAULT_MAX_GAMES_LISTED: usize = 30;
pub const DEFAULT_HISTORY_CACHE_SECS: u64 = 3600;
pub const DEFAULT_REFRESH_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub db_path: Option<PathBuf>,
    pub history_cache_ttl: Duration,
    pub refresh_interval: Duration,
    pub recent_window: usize,
    pub max_games_listed: usize,
    pub upcoming_window_days: u32,
    pub fetch_parallelism: usize,
    pub leagues: Vec<League>,
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            db_path: history_store::default_db_path(),
            history_cache_ttl: Duration::from_secs(DEFAULT_HISTORY_CACHE_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            recent_window: DEFAULT_RECENT_WINDOW,
            max_games_listed: DEFAULT_MAX_GAMES_LISTED,
            upcoming_window_days: 7,
            fetch_parallelism: 2,
            leagues: League::ALL.to_vec(),
            demo_mode: false,
        }
    }
}

impl Config {
    /// Reads the process environment. Call `load_dotenv` first to pick up
    /// `.env.local` / `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| non_empty(key).and_then(|v| v.trim().parse::<u64>().ok());

        let api_key = non_empty("FOOTBALL_DATA_API_KEY").map(|v| v.trim().to_string());
        let leagues = non_empty("APP_LEAGUES")
            .map(|raw| parse_league_codes(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.leagues);
        let demo_flag = non_empty("DEMO_MODE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            demo_mode: demo_flag,
            api_key,
            db_path: non_empty("HIST_DB_PATH")
                .map(PathBuf::from)
                .or(defaults.db_path),
            history_cache_ttl: Duration::from_secs(
                number("HISTORY_CACHE_SECS")
                    .unwrap_or(DEFAULT_HISTORY_CACHE_SECS)
                    .max(60),
            ),
            refresh_interval: Duration::from_secs(
                number("REFRESH_SECS")
                    .unwrap_or(DEFAULT_REFRESH_SECS)
                    .max(300),
            ),
            recent_window: number("RECENT_WINDOW")
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_RECENT_WINDOW)
                .clamp(1, 50),
            max_games_listed: number("MAX_GAMES_LISTED")
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_MAX_GAMES_LISTED)
                .clamp(1, 200),
            upcoming_window_days: number("UPCOMING_WINDOW_DAYS")
                .map(|n| n.clamp(1, 14) as u32)
                .unwrap_or(defaults.upcoming_window_days),
            fetch_parallelism: number("FETCH_PARALLELISM")
                .map(|n| n as usize)
                .unwrap_or(defaults.fetch_parallelism)
                .clamp(1, 8),
            leagues,
        }
    }
}

/// Where a report reads its history from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportHistory {
    Demo,
    Sqlite(PathBuf),
}

/// Source and database for a one-shot refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshPlan {
    /// Seeded demo rows; `None` keeps them in memory.
    Demo { db_path: Option<PathBuf> },
    Live { api_key: String, db_path: PathBuf },
}

impl Config {
    /// The key to fetch with, unless demo data was asked for.
    pub fn live_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|_| !self.demo_mode)
    }

    /// Reading stored history needs no API key, so demo rows are only used
    /// when asked for.
    pub fn report_history(&self, demo_flag: bool, db_override: Option<PathBuf>) -> Result<ReportHistory> {
        if demo_flag || self.demo_mode {
            return Ok(ReportHistory::Demo);
        }
        db_override
            .or_else(|| self.db_path.clone())
            .map(ReportHistory::Sqlite)
            .ok_or_else(|| anyhow!("unable to resolve sqlite path; pass --db"))
    }

    /// Demo rows go to memory unless a database is named explicitly, so they
    /// never land in the default history file.
    pub fn refresh_plan(&self, demo_flag: bool, db_override: Option<PathBuf>) -> Result<RefreshPlan> {
        if demo_flag || self.demo_mode {
            return Ok(RefreshPlan::Demo { db_path: db_override });
        }
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("FOOTBALL_DATA_API_KEY is not set; pass --demo for synthetic data"))?;
        let db_path = db_override
            .or_else(|| self.db_path.clone())
            .ok_or_else(|| anyhow!("unable to resolve sqlite path; pass --db"))?;
        Ok(RefreshPlan::Live { api_key, db_path })
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
