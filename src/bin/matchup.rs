use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use h2h_terminal::config::{self, Config, ReportHistory};
use h2h_terminal::demo_feed::DemoSource;
use h2h_terminal::history_store::{MatchHistoryStore, SqliteHistory};
use h2h_terminal::ingest::MatchSource;
use h2h_terminal::league::League;
use h2h_terminal::logging;
use h2h_terminal::report::{MatchupReport, default_presets};
use h2h_terminal::stats_export::export_matchup;

const USAGE: &str = "usage: matchup --league CODE --home TEAM --away TEAM \
[--window N] [--preset 1|2] [--recent] [--json] [--xlsx PATH] [--db PATH] [--demo]";

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr();
    let config = Config::from_env();

    let league = arg_value("--league")
        .as_deref()
        .and_then(League::from_code)
        .ok_or_else(|| anyhow!("missing or unknown --league\n{USAGE}"))?;
    let home = arg_value("--home").ok_or_else(|| anyhow!("missing --home\n{USAGE}"))?;
    let away = arg_value("--away").ok_or_else(|| anyhow!("missing --away\n{USAGE}"))?;
    let window = match arg_value("--window") {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid --window {raw}"))?,
        None => config.recent_window,
    };
    let presets = default_presets(window);
    let preset_idx = match arg_value("--preset") {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=presets.len()).contains(n))
            .with_context(|| format!("--preset must be 1..={}", presets.len()))?,
        None => 1,
    };
    let preset = &presets[preset_idx - 1];

    let history = match config.report_history(has_flag("--demo"), arg_value("--db").map(PathBuf::from))? {
        ReportHistory::Demo => DemoSource::new(2024).finished_matches(league)?,
        ReportHistory::Sqlite(db_path) => SqliteHistory::open(&db_path)?.get(league)?,
    };

    let report = MatchupReport::compute(league, &history, &home, &away, preset);

    if let Some(path) = arg_value("--xlsx") {
        let done = export_matchup(Path::new(&path), &report)?;
        eprintln!(
            "wrote {} summary rows and {} recent rows to {path}",
            done.summary_rows, done.recent_rows
        );
    }

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if has_flag("--recent") {
        println!("{}", report.render_recent().join("\n"));
    } else {
        println!("{}", report.render().join("\n"));
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
