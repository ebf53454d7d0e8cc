use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MATCH_DATE_FORMAT: &str = "%d/%m/%Y";

/// One finished match in a league's history.
///
/// Second-half goals are not stored; they are the difference between the
/// full-time and first-half figures for each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub goals_home_full: u32,
    pub goals_away_full: u32,
    pub goals_home_first_half: u32,
    pub goals_away_first_half: u32,
    pub date: NaiveDate,
}

/// Row-contract violations found while turning a stored row into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a non-negative integer: {value:?}")]
    InvalidGoals { field: &'static str, value: String },
    #[error("unparsable match date {0:?} (expected DD/MM/YYYY)")]
    InvalidDate(String),
    #[error("{side} first-half goals ({first_half}) exceed full-time goals ({full})")]
    FirstHalfExceedsFull {
        side: &'static str,
        full: u32,
        first_half: u32,
    },
}

/// A history row as it arrives from a loosely typed source (sheet export,
/// JSON dump). Every cell is text and any of them may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMatchRow {
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub goals_home_full: Option<String>,
    #[serde(default)]
    pub goals_away_full: Option<String>,
    #[serde(default)]
    pub goals_home_first_half: Option<String>,
    #[serde(default)]
    pub goals_away_first_half: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl MatchRecord {
    pub fn try_new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        full: (u32, u32),
        first_half: (u32, u32),
        date: NaiveDate,
    ) -> Result<Self, RowError> {
        if first_half.0 > full.0 {
            return Err(RowError::FirstHalfExceedsFull {
                side: "home",
                full: full.0,
                first_half: first_half.0,
            });
        }
        if first_half.1 > full.1 {
            return Err(RowError::FirstHalfExceedsFull {
                side: "away",
                full: full.1,
                first_half: first_half.1,
            });
        }
        Ok(Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            goals_home_full: full.0,
            goals_away_full: full.1,
            goals_home_first_half: first_half.0,
            goals_away_first_half: first_half.1,
            date,
        })
    }

    pub fn from_row(row: &RawMatchRow) -> Result<Self, RowError> {
        let home_team = required_text(row.home_team.as_deref(), "home_team")?;
        let away_team = required_text(row.away_team.as_deref(), "away_team")?;
        let gh = required_goals(row.goals_home_full.as_deref(), "goals_home_full")?;
        let ga = required_goals(row.goals_away_full.as_deref(), "goals_away_full")?;
        let gh1 = required_goals(
            row.goals_home_first_half.as_deref(),
            "goals_home_first_half",
        )?;
        let ga1 = required_goals(
            row.goals_away_first_half.as_deref(),
            "goals_away_first_half",
        )?;
        let date = parse_match_date(required_text(row.date.as_deref(), "date")?)?;
        Self::try_new(home_team, away_team, (gh, ga), (gh1, ga1), date)
    }

    pub fn goals_home_second_half(&self) -> u32 {
        self.goals_home_full
            .saturating_sub(self.goals_home_first_half)
    }

    pub fn goals_away_second_half(&self) -> u32 {
        self.goals_away_full
            .saturating_sub(self.goals_away_first_half)
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

pub fn parse_match_date(raw: &str) -> Result<NaiveDate, RowError> {
    NaiveDate::parse_from_str(raw.trim(), MATCH_DATE_FORMAT)
        .map_err(|_| RowError::InvalidDate(raw.to_string()))
}

pub fn format_match_date(date: NaiveDate) -> String {
    date.format(MATCH_DATE_FORMAT).to_string()
}

/// Converts a batch of raw rows, failing on the first contract violation.
/// The error carries the zero-based row index.
pub fn records_from_rows(rows: &[RawMatchRow]) -> Result<Vec<MatchRecord>, (usize, RowError)> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| MatchRecord::from_row(row).map_err(|err| (idx, err)))
        .collect()
}

fn required_text<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, RowError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RowError::MissingField(field)),
    }
}

fn required_goals(value: Option<&str>, field: &'static str) -> Result<u32, RowError> {
    let raw = required_text(value, field)?;
    raw.parse::<u32>().map_err(|_| RowError::InvalidGoals {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str) -> RawMatchRow {
        RawMatchRow {
            home_team: Some("Flamengo".to_string()),
            away_team: Some("Palmeiras".to_string()),
            goals_home_full: Some("3".to_string()),
            goals_away_full: Some("1".to_string()),
            goals_home_first_half: Some("1".to_string()),
            goals_away_first_half: Some("1".to_string()),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn from_row_parses_day_month_year() {
        let record = MatchRecord::from_row(&row("07/03/2024")).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(record.goals_home_second_half(), 2);
        assert_eq!(record.goals_away_second_half(), 0);
        assert_eq!(format_match_date(record.date), "07/03/2024");
    }

    #[test]
    fn from_row_rejects_bad_dates() {
        assert_eq!(
            MatchRecord::from_row(&row("2024-03-07")),
            Err(RowError::InvalidDate("2024-03-07".to_string()))
        );
        assert!(MatchRecord::from_row(&row("31/02/2024")).is_err());
    }

    #[test]
    fn from_row_rejects_missing_and_negative_cells() {
        let mut missing = row("01/01/2024");
        missing.away_team = Some("  ".to_string());
        assert_eq!(
            MatchRecord::from_row(&missing),
            Err(RowError::MissingField("away_team"))
        );

        let mut negative = row("01/01/2024");
        negative.goals_home_full = Some("-1".to_string());
        assert!(matches!(
            MatchRecord::from_row(&negative),
            Err(RowError::InvalidGoals {
                field: "goals_home_full",
                ..
            })
        ));
    }

    #[test]
    fn first_half_cannot_exceed_full_time() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = MatchRecord::try_new("A", "B", (1, 0), (0, 2), date).unwrap_err();
        assert_eq!(
            err,
            RowError::FirstHalfExceedsFull {
                side: "away",
                full: 0,
                first_half: 2
            }
        );
    }

    #[test]
    fn batch_conversion_reports_row_index() {
        let rows = vec![row("01/01/2024"), row("bad")];
        let (idx, err) = records_from_rows(&rows).unwrap_err();
        assert_eq!(idx, 1);
        assert_eq!(err, RowError::InvalidDate("bad".to_string()));
    }
}
