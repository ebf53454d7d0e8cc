use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use h2h_terminal::config::{self, Config, RefreshPlan};
use h2h_terminal::demo_feed::DemoSource;
use h2h_terminal::history_store::SqliteHistory;
use h2h_terminal::ingest::{FootballDataSource, MatchSource, import_rows_json, refresh_leagues};
use h2h_terminal::league::parse_league_codes;
use h2h_terminal::logging;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr();
    let config = Config::from_env();

    let leagues = arg_value("--leagues")
        .map(|raw| parse_league_codes(&raw))
        .unwrap_or_else(|| config.leagues.clone());
    if leagues.is_empty() {
        return Err(anyhow!("no league codes resolved for ingest"));
    }

    let db_override = arg_value("--db").map(PathBuf::from);

    if let Some(import_path) = arg_value("--import") {
        let [league] = leagues.as_slice() else {
            return Err(anyhow!("--import needs exactly one league in --leagues"));
        };
        let db_path = db_override
            .or_else(|| config.db_path.clone())
            .context("unable to resolve sqlite path")?;
        let store = SqliteHistory::open(&db_path)?;
        let raw = std::fs::read_to_string(&import_path)
            .with_context(|| format!("read {import_path}"))?;
        let appended = import_rows_json(&store, *league, &raw)?;
        println!("Imported {appended} new rows into {} ({})", league.code(), db_path.display());
        return Ok(());
    }

    let plan = config.refresh_plan(has_flag("--demo"), db_override)?;
    let (store, source, target) = match plan {
        RefreshPlan::Live { api_key, db_path } => {
            let source: Box<dyn MatchSource> = Box::new(FootballDataSource {
                api_key,
                upcoming_window_days: config.upcoming_window_days,
            });
            (SqliteHistory::open(&db_path)?, source, db_path.display().to_string())
        }
        RefreshPlan::Demo { db_path } => {
            let source: Box<dyn MatchSource> = Box::new(DemoSource::new(2024));
            match db_path {
                Some(path) => (
                    SqliteHistory::open(&path)?,
                    source,
                    format!("{} (demo data)", path.display()),
                ),
                None => (
                    SqliteHistory::open_in_memory()?,
                    source,
                    "in-memory (demo data)".to_string(),
                ),
            }
        }
    };

    let summary = refresh_leagues(&store, source.as_ref(), &leagues, config.fetch_parallelism);

    println!("History ingest complete");
    println!("DB: {target}");
    println!(
        "Matches appended: {} of {} seen",
        summary.matches_appended, summary.matches_seen
    );
    for item in &summary.per_league {
        println!(
            "league {}: seen={} appended={} fixtures={} latest={}",
            item.league.code(),
            item.matches_seen,
            item.matches_appended,
            item.fixtures,
            item.latest_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
        if let Some(err) = &item.error {
            println!("  error: {err}");
        }
    }

    let failed = summary.failed().count();
    if failed == summary.per_league.len() {
        return Err(anyhow!("every league failed to refresh"));
    }
    Ok(())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
