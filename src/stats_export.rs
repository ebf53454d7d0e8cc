use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::match_record::format_match_date;
use crate::rate_format::{mean, pct};
use crate::report::{MatchupReport, TeamReport};
use crate::stats::{CountStat, GoalStat, Split};

pub struct ExportReport {
    pub summary_rows: usize,
    pub recent_rows: usize,
}

pub fn export_matchup(path: &Path, report: &MatchupReport) -> Result<ExportReport> {
    let summary = summary_rows(report);
    let recent = recent_rows(report);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Recent")?;
        write_rows(sheet, &recent)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        summary_rows: summary.len().saturating_sub(1),
        recent_rows: recent.len().saturating_sub(1),
    })
}

pub fn summary_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Filter".to_string(),
        "Stat".to_string(),
        "Overall".to_string(),
        "Home".to_string(),
        "Away".to_string(),
    ]];
    for side in [&report.home, &report.away] {
        rows.extend(team_rows(side, &report.preset.label));
    }
    rows
}

fn team_rows(side: &TeamReport, filter: &str) -> Vec<Vec<String>> {
    let snap = &side.snapshot;
    let m = snap.matches;
    let line = |stat: &str, cells: [String; 3]| {
        let mut row = vec![side.team.clone(), filter.to_string(), stat.to_string()];
        row.extend(cells);
        row
    };

    let mut rows = vec![line("Matches", Split::ALL.map(|s| m.get(s).to_string()))];
    for stat in CountStat::ALL {
        let c = snap.count(stat);
        rows.push(line(stat.label(), Split::ALL.map(|s| pct(c.get(s), m.get(s)))));
    }
    for stat in GoalStat::ALL {
        let g = snap.goals(stat);
        rows.push(line(
            &format!("Avg {}", stat.label().to_lowercase()),
            Split::ALL.map(|s| mean(g.get(s), m.get(s))),
        ));
    }
    rows
}

pub fn recent_rows(report: &MatchupReport) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Date".to_string(),
        "Opponent".to_string(),
        "Venue".to_string(),
        "Score".to_string(),
        "Result".to_string(),
    ]];
    for side in [&report.home, &report.away] {
        for m in side.recent.iter().rev() {
            rows.push(vec![
                side.team.clone(),
                format_match_date(m.date),
                m.opponent.clone(),
                if m.is_home { "H" } else { "A" }.to_string(),
                format!("{}-{}", m.scored, m.conceded),
                m.outcome.marker().to_string(),
            ]);
        }
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
