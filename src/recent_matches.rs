use chrono::NaiveDate;

use crate::match_record::{MatchRecord, format_match_date};
use crate::stats::{SituationalCondition, StatsFilter, TeamPerspective, select_matches};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_goals(scored: u32, conceded: u32) -> Self {
        if scored > conceded {
            MatchOutcome::Win
        } else if scored == conceded {
            MatchOutcome::Draw
        } else {
            MatchOutcome::Loss
        }
    }

    pub fn marker(self) -> char {
        match self {
            MatchOutcome::Win => 'W',
            MatchOutcome::Draw => 'D',
            MatchOutcome::Loss => 'L',
        }
    }
}

/// One row of a team's recent results, from that team's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMatch {
    pub date: NaiveDate,
    pub opponent: String,
    pub is_home: bool,
    pub scored: u32,
    pub conceded: u32,
    pub outcome: MatchOutcome,
}

impl RecentMatch {
    fn from_record(record: &MatchRecord, team: &str) -> Self {
        let view = TeamPerspective::of(record, team);
        let opponent = if view.is_home {
            record.away_team.clone()
        } else {
            record.home_team.clone()
        };
        Self {
            date: record.date,
            opponent,
            is_home: view.is_home,
            scored: view.scored,
            conceded: view.conceded,
            outcome: MatchOutcome::from_goals(view.scored, view.conceded),
        }
    }

    /// `DD/MM/YYYY  vs Opponent (H)  2-1  W`, score given as scored-conceded.
    pub fn render(&self) -> String {
        let tag = if self.is_home { 'H' } else { 'A' };
        format!(
            "{}  vs {} ({tag})  {}-{}  {}",
            format_match_date(self.date),
            self.opponent,
            self.scored,
            self.conceded,
            self.outcome.marker()
        )
    }
}

/// Oldest first, using exactly the selection the aggregator uses.
pub fn recent_matches(history: &[MatchRecord], filter: &StatsFilter) -> Vec<RecentMatch> {
    select_matches(history, filter)
        .into_iter()
        .map(|m| RecentMatch::from_record(m, &filter.team_name))
        .collect()
}

pub fn list_recent_matches(
    history: &[MatchRecord],
    team_name: &str,
    recency_window: Option<usize>,
    condition: SituationalCondition,
) -> Vec<String> {
    let filter = StatsFilter::new(team_name)
        .with_window(recency_window)
        .with_condition(condition);
    recent_matches(history, &filter)
        .iter()
        .map(RecentMatch::render)
        .collect()
}
