use serde::{Deserialize, Serialize};

use crate::match_record::MatchRecord;

/// Which of a team's appearances a query admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SituationalCondition {
    #[default]
    None,
    HomeOnly,
    AwayOnly,
}

impl SituationalCondition {
    pub fn admits(self, record: &MatchRecord, team: &str) -> bool {
        match self {
            SituationalCondition::None => record.involves(team),
            SituationalCondition::HomeOnly => record.home_team == team,
            SituationalCondition::AwayOnly => record.away_team == team,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SituationalCondition::None => "all",
            SituationalCondition::HomeOnly => "home only",
            SituationalCondition::AwayOnly => "away only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsFilter {
    pub team_name: String,
    /// Keep only the latest N qualifying matches. `Some(0)` admits nothing.
    pub recency_window: Option<usize>,
    pub condition: SituationalCondition,
}

impl StatsFilter {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            recency_window: None,
            condition: SituationalCondition::None,
        }
    }

    pub fn with_window(mut self, window: Option<usize>) -> Self {
        self.recency_window = window;
        self
    }

    pub fn with_condition(mut self, condition: SituationalCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// A counter tracked overall and split by the side the team played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SplitCount {
    pub total: u32,
    pub home: u32,
    pub away: u32,
}

impl SplitCount {
    fn add(&mut self, is_home: bool, value: u32) {
        self.total += value;
        if is_home {
            self.home += value;
        } else {
            self.away += value;
        }
    }

    fn bump_if(&mut self, is_home: bool, hit: bool) {
        if hit {
            self.add(is_home, 1);
        }
    }

    pub fn get(&self, split: Split) -> u32 {
        match split {
            Split::Overall => self.total,
            Split::Home => self.home,
            Split::Away => self.away,
        }
    }

    pub fn is_conserved(&self) -> bool {
        self.home + self.away == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Overall,
    Home,
    Away,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Overall, Split::Home, Split::Away];

    pub fn label(self) -> &'static str {
        match self {
            Split::Overall => "Overall",
            Split::Home => "Home",
            Split::Away => "Away",
        }
    }
}

/// Per-match predicates counted by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountStat {
    Over15,
    Over25,
    BothTeamsScored,
    GoalsInBothHalves,
    FirstHalfOver05,
    SecondHalfOver05,
    SecondHalfOver15,
}

impl CountStat {
    pub const ALL: [CountStat; 7] = [
        CountStat::Over15,
        CountStat::Over25,
        CountStat::BothTeamsScored,
        CountStat::GoalsInBothHalves,
        CountStat::FirstHalfOver05,
        CountStat::SecondHalfOver05,
        CountStat::SecondHalfOver15,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CountStat::Over15 => "Over 1.5",
            CountStat::Over25 => "Over 2.5",
            CountStat::BothTeamsScored => "BTTS",
            CountStat::GoalsInBothHalves => "Goals both halves",
            CountStat::FirstHalfOver05 => "1H over 0.5",
            CountStat::SecondHalfOver05 => "2H over 0.5",
            CountStat::SecondHalfOver15 => "2H over 1.5",
        }
    }
}

/// Cumulative goal sums kept by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalStat {
    Scored,
    Conceded,
    Total,
    FirstHalfScored,
    FirstHalfConceded,
    SecondHalfScored,
    SecondHalfConceded,
}

impl GoalStat {
    pub const ALL: [GoalStat; 7] = [
        GoalStat::Scored,
        GoalStat::Conceded,
        GoalStat::Total,
        GoalStat::FirstHalfScored,
        GoalStat::FirstHalfConceded,
        GoalStat::SecondHalfScored,
        GoalStat::SecondHalfConceded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GoalStat::Scored => "Scored",
            GoalStat::Conceded => "Conceded",
            GoalStat::Total => "Total goals",
            GoalStat::FirstHalfScored => "1H scored",
            GoalStat::FirstHalfConceded => "1H conceded",
            GoalStat::SecondHalfScored => "2H scored",
            GoalStat::SecondHalfConceded => "2H conceded",
        }
    }
}

/// Aggregated statistics for one team under one filter.
///
/// `matches.total == 0` means the filter matched nothing; every rate derived
/// from such a snapshot must be rendered as "no data".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub matches: SplitCount,
    pub over_1_5: SplitCount,
    pub over_2_5: SplitCount,
    pub both_teams_scored: SplitCount,
    pub goals_in_both_halves: SplitCount,
    pub first_half_over_0_5: SplitCount,
    pub second_half_over_0_5: SplitCount,
    pub second_half_over_1_5: SplitCount,
    pub goals_scored: SplitCount,
    pub goals_conceded: SplitCount,
    pub goals_total: SplitCount,
    pub first_half_scored: SplitCount,
    pub first_half_conceded: SplitCount,
    pub second_half_scored: SplitCount,
    pub second_half_conceded: SplitCount,
}

impl StatsSnapshot {
    pub fn total(&self) -> u32 {
        self.matches.total
    }

    pub fn has_data(&self) -> bool {
        self.matches.total > 0
    }

    pub fn count(&self, stat: CountStat) -> SplitCount {
        match stat {
            CountStat::Over15 => self.over_1_5,
            CountStat::Over25 => self.over_2_5,
            CountStat::BothTeamsScored => self.both_teams_scored,
            CountStat::GoalsInBothHalves => self.goals_in_both_halves,
            CountStat::FirstHalfOver05 => self.first_half_over_0_5,
            CountStat::SecondHalfOver05 => self.second_half_over_0_5,
            CountStat::SecondHalfOver15 => self.second_half_over_1_5,
        }
    }

    pub fn goals(&self, stat: GoalStat) -> SplitCount {
        match stat {
            GoalStat::Scored => self.goals_scored,
            GoalStat::Conceded => self.goals_conceded,
            GoalStat::Total => self.goals_total,
            GoalStat::FirstHalfScored => self.first_half_scored,
            GoalStat::FirstHalfConceded => self.first_half_conceded,
            GoalStat::SecondHalfScored => self.second_half_scored,
            GoalStat::SecondHalfConceded => self.second_half_conceded,
        }
    }

    /// Every split adds up to its overall value and no predicate count
    /// exceeds the matches it was drawn from.
    pub fn is_conserved(&self) -> bool {
        let splits_add_up = std::iter::once(self.matches)
            .chain(CountStat::ALL.iter().map(|s| self.count(*s)))
            .chain(GoalStat::ALL.iter().map(|s| self.goals(*s)))
            .all(|c| c.is_conserved());
        let bounded = CountStat::ALL.iter().all(|s| {
            let c = self.count(*s);
            c.total <= self.matches.total
                && c.home <= self.matches.home
                && c.away <= self.matches.away
        });
        splits_add_up && bounded
    }

    fn accumulate(&mut self, view: &TeamPerspective, both_scored: bool) {
        let h = view.is_home;
        let full = view.scored + view.conceded;
        let first = view.first_half_scored + view.first_half_conceded;
        let second = view.second_half_scored + view.second_half_conceded;

        self.matches.add(h, 1);
        self.goals_scored.add(h, view.scored);
        self.goals_conceded.add(h, view.conceded);
        self.goals_total.add(h, full);
        self.first_half_scored.add(h, view.first_half_scored);
        self.first_half_conceded.add(h, view.first_half_conceded);
        self.second_half_scored.add(h, view.second_half_scored);
        self.second_half_conceded.add(h, view.second_half_conceded);

        // Integer totals: `> 1` is "over 1.5", `> 2` is "over 2.5", `> 0` is "over 0.5".
        self.over_1_5.bump_if(h, full > 1);
        self.over_2_5.bump_if(h, full > 2);
        self.both_teams_scored.bump_if(h, both_scored);
        self.first_half_over_0_5.bump_if(h, first > 0);
        self.second_half_over_0_5.bump_if(h, second > 0);
        self.second_half_over_1_5.bump_if(h, second > 1);
        self.goals_in_both_halves.bump_if(h, first > 0 && second > 0);
    }
}

/// A match seen from one team's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamPerspective {
    pub is_home: bool,
    pub scored: u32,
    pub conceded: u32,
    pub first_half_scored: u32,
    pub first_half_conceded: u32,
    pub second_half_scored: u32,
    pub second_half_conceded: u32,
}

impl TeamPerspective {
    pub fn of(record: &MatchRecord, team: &str) -> Self {
        let home = (
            record.goals_home_full,
            record.goals_home_first_half,
            record.goals_home_second_half(),
        );
        let away = (
            record.goals_away_full,
            record.goals_away_first_half,
            record.goals_away_second_half(),
        );
        let is_home = record.home_team == team;
        let (own, other) = if is_home { (home, away) } else { (away, home) };
        Self {
            is_home,
            scored: own.0,
            conceded: other.0,
            first_half_scored: own.1,
            first_half_conceded: other.1,
            second_half_scored: own.2,
            second_half_conceded: other.2,
        }
    }
}

/// Selection, ordering and windowing shared by the aggregator and the
/// recent-match lister. Equal dates keep their input order.
pub fn select_matches<'a>(history: &'a [MatchRecord], filter: &StatsFilter) -> Vec<&'a MatchRecord> {
    let mut selected: Vec<&MatchRecord> = history
        .iter()
        .filter(|m| filter.condition.admits(m, &filter.team_name))
        .collect();
    selected.sort_by_key(|m| m.date);

    if let Some(window) = filter.recency_window {
        let excess = selected.len().saturating_sub(window);
        selected.drain(..excess);
    }
    selected
}

pub fn compute(history: &[MatchRecord], filter: &StatsFilter) -> StatsSnapshot {
    let mut snapshot = StatsSnapshot::default();
    for record in select_matches(history, filter) {
        let view = TeamPerspective::of(record, &filter.team_name);
        let both_scored = record.goals_home_full > 0 && record.goals_away_full > 0;
        snapshot.accumulate(&view, both_scored);
    }
    snapshot
}

pub fn compute_stats(
    history: &[MatchRecord],
    team_name: &str,
    recency_window: Option<usize>,
    condition: SituationalCondition,
) -> StatsSnapshot {
    let filter = StatsFilter::new(team_name)
        .with_window(recency_window)
        .with_condition(condition);
    compute(history, &filter)
}
