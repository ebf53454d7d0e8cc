use serde::Serialize;

use crate::league::League;
use crate::match_record::MatchRecord;
use crate::rate_format::{mean, pct, ratio_with_pct, saturating_count};
use crate::recent_matches::{MatchOutcome, RecentMatch, recent_matches};
use crate::stats::{
    CountStat, GoalStat, SituationalCondition, Split, StatsFilter, StatsSnapshot, compute,
};

pub const NO_DATA_LINE: &str = "No data for this filter";

/// A named pair of filters applied to the two sides of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchupPreset {
    pub label: String,
    pub window: Option<usize>,
    pub home_condition: SituationalCondition,
    pub away_condition: SituationalCondition,
}

pub fn default_presets(window: usize) -> Vec<MatchupPreset> {
    vec![
        MatchupPreset {
            label: format!("Last {window} overall"),
            window: Some(window),
            home_condition: SituationalCondition::None,
            away_condition: SituationalCondition::None,
        },
        MatchupPreset {
            label: format!("Last {window} (home at home vs away away)"),
            window: Some(window),
            home_condition: SituationalCondition::HomeOnly,
            away_condition: SituationalCondition::AwayOnly,
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub team: String,
    pub condition: SituationalCondition,
    pub snapshot: StatsSnapshot,
    #[serde(skip)]
    pub recent: Vec<RecentMatch>,
}

impl TeamReport {
    fn compute(history: &[MatchRecord], team: &str, window: Option<usize>, condition: SituationalCondition) -> Self {
        let filter = StatsFilter::new(team)
            .with_window(window)
            .with_condition(condition);
        Self {
            team: team.to_string(),
            condition,
            snapshot: compute(history, &filter),
            recent: recent_matches(history, &filter),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchupReport {
    pub league: League,
    pub preset: MatchupPreset,
    pub home: TeamReport,
    pub away: TeamReport,
}

impl MatchupReport {
    pub fn compute(
        league: League,
        history: &[MatchRecord],
        home: &str,
        away: &str,
        preset: &MatchupPreset,
    ) -> Self {
        Self {
            league,
            preset: preset.clone(),
            home: TeamReport::compute(history, home, preset.window, preset.home_condition),
            away: TeamReport::compute(history, away, preset.window, preset.away_condition),
        }
    }

    pub fn title(&self) -> String {
        format!(
            "{} vs {} | {} | {}",
            self.home.team,
            self.away.team,
            self.league.label(),
            self.preset.label
        )
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![self.title(), String::new()];
        lines.extend(render_snapshot(
            &self.home.team,
            self.home.condition,
            self.preset.window,
            &self.home.snapshot,
        ));
        lines.push(String::new());
        lines.extend(render_snapshot(
            &self.away.team,
            self.away.condition,
            self.preset.window,
            &self.away.snapshot,
        ));
        lines
    }

    pub fn render_recent(&self) -> Vec<String> {
        let mut lines = vec![self.title()];
        for side in [&self.home, &self.away] {
            lines.push(String::new());
            lines.push(section_heading(&side.team, side.condition, self.preset.window));
            if side.recent.is_empty() {
                lines.push(NO_DATA_LINE.to_string());
                continue;
            }
            // Newest first on screen.
            lines.extend(side.recent.iter().rev().map(RecentMatch::render));
            let wins = side
                .recent
                .iter()
                .filter(|m| m.outcome == MatchOutcome::Win)
                .count();
            lines.push(format!(
                "Won {}",
                ratio_with_pct(saturating_count(wins), saturating_count(side.recent.len()))
            ));
        }
        lines
    }
}

pub fn render_snapshot(
    team: &str,
    condition: SituationalCondition,
    window: Option<usize>,
    snapshot: &StatsSnapshot,
) -> Vec<String> {
    let mut lines = vec![section_heading(team, condition, window)];
    if !snapshot.has_data() {
        lines.push(NO_DATA_LINE.to_string());
        return lines;
    }

    let m = snapshot.matches;
    lines.push(format!(
        "Matches: {} (home {} / away {})",
        m.total, m.home, m.away
    ));
    lines.push(row("", Split::ALL.map(|s| s.label().to_string())));
    for stat in CountStat::ALL {
        let c = snapshot.count(stat);
        lines.push(row(
            stat.label(),
            Split::ALL.map(|s| pct(c.get(s), m.get(s))),
        ));
    }
    for stat in GoalStat::ALL {
        let g = snapshot.goals(stat);
        lines.push(row(
            &format!("Avg {}", stat.label().to_lowercase()),
            Split::ALL.map(|s| mean(g.get(s), m.get(s))),
        ));
    }
    lines
}

fn section_heading(team: &str, condition: SituationalCondition, window: Option<usize>) -> String {
    let scope = match window {
        Some(n) => format!("last {n}"),
        None => "all matches".to_string(),
    };
    format!("== {team} ({scope}, {}) ==", condition.label())
}

fn row(label: &str, cells: [String; 3]) -> String {
    format!(
        "{label:<20}{:>10}{:>10}{:>10}",
        cells[0], cells[1], cells[2]
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::rate_format::NO_DATA;

    #[test]
    fn home_only_split_renders_no_data_for_away_column() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let history = vec![MatchRecord::try_new("A", "B", (2, 0), (1, 0), date).unwrap()];
        let snap = compute(
            &history,
            &StatsFilter::new("A").with_condition(SituationalCondition::HomeOnly),
        );
        let lines = render_snapshot("A", SituationalCondition::HomeOnly, Some(10), &snap);
        assert_eq!(lines[0], "== A (last 10, home only) ==");
        let over15 = lines.iter().find(|l| l.starts_with("Over 1.5")).unwrap();
        assert!(over15.contains("100.0%"));
        assert!(over15.trim_end().ends_with(NO_DATA));
    }

    #[test]
    fn recent_view_lists_newest_first_with_win_ratio() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let history = vec![
            MatchRecord::try_new("A", "B", (2, 0), (1, 0), d(1)).unwrap(),
            MatchRecord::try_new("C", "A", (1, 1), (0, 0), d(8)).unwrap(),
        ];
        let preset = &default_presets(10)[0];
        let report = MatchupReport::compute(League::SerieA, &history, "A", "Z", preset);
        let lines = report.render_recent();
        assert_eq!(lines[2], "== A (last 10, all) ==");
        assert_eq!(lines[3], "08/05/2024  vs C (A)  1-1  D");
        assert_eq!(lines[4], "01/05/2024  vs B (H)  2-0  W");
        assert_eq!(lines[5], "Won 1/2 (50.0%)");
        assert_eq!(lines.last().map(String::as_str), Some(NO_DATA_LINE));
    }

    #[test]
    fn empty_snapshot_renders_sentinel_line() {
        let lines = render_snapshot("X", SituationalCondition::None, None, &StatsSnapshot::default());
        assert_eq!(lines, vec!["== X (all matches, all) ==".to_string(), NO_DATA_LINE.to_string()]);
    }
}
