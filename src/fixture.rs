use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::league::League;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixtureStatus {
    Scheduled,
    Timed,
    InPlay,
    HalfTime,
    Paused,
    Finished,
    Other,
}

impl FixtureStatus {
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => FixtureStatus::Scheduled,
            "TIMED" => FixtureStatus::Timed,
            "IN_PLAY" | "LIVE" => FixtureStatus::InPlay,
            "HALF_TIME" => FixtureStatus::HalfTime,
            "PAUSED" => FixtureStatus::Paused,
            "FINISHED" => FixtureStatus::Finished,
            _ => FixtureStatus::Other,
        }
    }

    pub fn api_code(self) -> &'static str {
        match self {
            FixtureStatus::Scheduled => "SCHEDULED",
            FixtureStatus::Timed => "TIMED",
            FixtureStatus::InPlay => "IN_PLAY",
            FixtureStatus::HalfTime => "HALF_TIME",
            FixtureStatus::Paused => "PAUSED",
            FixtureStatus::Finished => "FINISHED",
            FixtureStatus::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FixtureStatus::Scheduled | FixtureStatus::Timed => "SCHED",
            FixtureStatus::InPlay => "LIVE",
            FixtureStatus::HalfTime => "HT",
            FixtureStatus::Paused => "PAUSE",
            FixtureStatus::Finished => "FT",
            FixtureStatus::Other => "-",
        }
    }
}

/// A scheduled or in-progress match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u64,
    pub league: League,
    pub home: String,
    pub away: String,
    /// Kick-off in UTC.
    pub kickoff: NaiveDateTime,
    pub status: FixtureStatus,
    #[serde(default)]
    pub score: Option<(u32, u32)>,
}

impl Fixture {
    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            FixtureStatus::InPlay | FixtureStatus::HalfTime | FixtureStatus::Paused
        )
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self.status, FixtureStatus::Scheduled | FixtureStatus::Timed)
    }

    pub fn display_line(&self) -> String {
        let when = self.kickoff.format("%d/%m %H:%M");
        match self.score {
            Some((h, a)) if self.is_live() => format!(
                "{when} {} {} {h}-{a} {}",
                self.status.label(),
                self.home,
                self.away
            ),
            _ => format!("{when}  {} vs {}", self.home, self.away),
        }
    }
}

/// Caps a fixture list for menus, soonest kick-off first.
pub fn limit_fixtures(mut fixtures: Vec<Fixture>, max: usize) -> Vec<Fixture> {
    fixtures.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then(a.id.cmp(&b.id)));
    fixtures.truncate(max);
    fixtures
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn fixture(id: u64, hour: u32, status: FixtureStatus) -> Fixture {
        Fixture {
            id,
            league: League::PremierLeague,
            home: "Arsenal".to_string(),
            away: "Chelsea".to_string(),
            kickoff: NaiveDate::from_ymd_opt(2024, 8, 17)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            status,
            score: Some((1, 0)),
        }
    }

    #[test]
    fn live_statuses() {
        assert!(fixture(1, 12, FixtureStatus::HalfTime).is_live());
        assert!(fixture(1, 12, FixtureStatus::Paused).is_live());
        assert!(!fixture(1, 12, FixtureStatus::Timed).is_live());
        assert!(fixture(1, 12, FixtureStatus::Timed).is_upcoming());
        assert_eq!(FixtureStatus::from_api("in_play"), FixtureStatus::InPlay);
        assert_eq!(FixtureStatus::from_api("POSTPONED"), FixtureStatus::Other);
    }

    #[test]
    fn limit_sorts_then_truncates() {
        let out = limit_fixtures(
            vec![
                fixture(3, 20, FixtureStatus::Timed),
                fixture(1, 12, FixtureStatus::Timed),
                fixture(2, 15, FixtureStatus::Timed),
            ],
            2,
        );
        assert_eq!(out.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
