use std::collections::BTreeSet;

use chrono::NaiveDate;

use h2h_terminal::match_record::{MatchRecord, format_match_date};
use h2h_terminal::recent_matches::{MatchOutcome, list_recent_matches, recent_matches};
use h2h_terminal::stats::{SituationalCondition, StatsFilter, compute, select_matches};

fn history() -> Vec<MatchRecord> {
    let d = |day: u32, month: u32| NaiveDate::from_ymd_opt(2024, month, day).unwrap();
    vec![
        MatchRecord::try_new("Benfica", "Porto", (2, 2), (1, 0), d(3, 2)).unwrap(),
        MatchRecord::try_new("Porto", "Braga", (0, 2), (0, 1), d(9, 2)).unwrap(),
        MatchRecord::try_new("Sporting CP", "Benfica", (1, 1), (0, 0), d(17, 2)).unwrap(),
        MatchRecord::try_new("Braga", "Porto", (1, 3), (1, 1), d(24, 2)).unwrap(),
        MatchRecord::try_new("Porto", "Famalicão", (2, 1), (2, 0), d(2, 3)).unwrap(),
        MatchRecord::try_new("Rio Ave", "Porto", (0, 0), (0, 0), d(10, 3)).unwrap(),
    ]
}

#[test]
fn lister_renders_from_the_team_side_oldest_first() {
    let lines = list_recent_matches(&history(), "Porto", Some(3), SituationalCondition::None);
    assert_eq!(
        lines,
        vec![
            "24/02/2024  vs Braga (A)  3-1  W",
            "02/03/2024  vs Famalicão (H)  2-1  W",
            "10/03/2024  vs Rio Ave (A)  0-0  D",
        ]
    );
}

#[test]
fn away_only_lists_away_games() {
    let filter = StatsFilter::new("Porto").with_condition(SituationalCondition::AwayOnly);
    let rows = recent_matches(&history(), &filter);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| !r.is_home));
    assert_eq!(rows[0].outcome, MatchOutcome::Draw);
    assert_eq!(rows[0].opponent, "Benfica");
}

#[test]
fn loss_marker_and_empty_selection() {
    let lines = list_recent_matches(&history(), "Porto", Some(4), SituationalCondition::HomeOnly);
    assert_eq!(lines[0], "09/02/2024  vs Braga (H)  0-2  L");
    assert!(list_recent_matches(&history(), "Nacional", None, SituationalCondition::None).is_empty());
}

#[test]
fn lister_and_aggregator_see_the_same_matches() {
    let history = history();
    let conditions = [
        SituationalCondition::None,
        SituationalCondition::HomeOnly,
        SituationalCondition::AwayOnly,
    ];
    for team in ["Porto", "Benfica", "Braga"] {
        for condition in conditions {
            for window in [None, Some(0), Some(1), Some(2), Some(5)] {
                let filter = StatsFilter::new(team)
                    .with_window(window)
                    .with_condition(condition);

                let listed: BTreeSet<(String, String)> = recent_matches(&history, &filter)
                    .into_iter()
                    .map(|r| (r.opponent, format_match_date(r.date)))
                    .collect();
                let aggregated: BTreeSet<(String, String)> = select_matches(&history, &filter)
                    .into_iter()
                    .map(|m| {
                        let opponent = if m.home_team == team {
                            m.away_team.clone()
                        } else {
                            m.home_team.clone()
                        };
                        (opponent, format_match_date(m.date))
                    })
                    .collect();

                assert_eq!(listed, aggregated);
                assert_eq!(listed.len(), compute(&history, &filter).total() as usize);
            }
        }
    }
}
