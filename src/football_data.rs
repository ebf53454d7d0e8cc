use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fixture::{Fixture, FixtureStatus};
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::league::League;
use crate::match_record::MatchRecord;

const FOOTBALL_DATA_BASE: &str = "https://api.football-data.org/v4";
const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureQuery {
    /// Scheduled matches from `today` through `today + days`.
    Upcoming { today: NaiveDate, days: u32 },
    Live,
}

pub fn fetch_finished_matches(league: League, api_key: &str) -> Result<Vec<MatchRecord>> {
    let url = format!(
        "{FOOTBALL_DATA_BASE}/competitions/{}/matches?status=FINISHED",
        league.code()
    );
    let body = fetch(&url, api_key).context("finished matches request failed")?;
    let rows = parse_matches_json(&body, league)?;
    debug!(league = league.code(), rows = rows.len(), "fetched finished matches");
    Ok(rows)
}

pub fn fetch_fixtures(league: League, api_key: &str, query: FixtureQuery) -> Result<Vec<Fixture>> {
    let url = fixtures_url(league, query);
    let body = fetch(&url, api_key).context("fixtures request failed")?;
    let mut fixtures = parse_fixtures_json(&body, league)?;
    match query {
        FixtureQuery::Upcoming { .. } => fixtures.retain(Fixture::is_upcoming),
        FixtureQuery::Live => fixtures.retain(Fixture::is_live),
    }
    Ok(fixtures)
}

fn fetch(url: &str, api_key: &str) -> Result<String> {
    let client = http_client()?;
    fetch_json_cached(client, url, &[(AUTH_HEADER, api_key)])
}

fn fixtures_url(league: League, query: FixtureQuery) -> String {
    let code = league.code();
    match query {
        FixtureQuery::Upcoming { today, days } => {
            let to = today + ChronoDuration::days(i64::from(days));
            format!(
                "{FOOTBALL_DATA_BASE}/competitions/{code}/matches?status=SCHEDULED,TIMED&dateFrom={}&dateTo={}",
                today.format("%Y-%m-%d"),
                to.format("%Y-%m-%d")
            )
        }
        FixtureQuery::Live => {
            format!("{FOOTBALL_DATA_BASE}/competitions/{code}/matches?status=IN_PLAY,PAUSED")
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    id: u64,
    utc_date: String,
    #[serde(default)]
    status: String,
    home_team: ApiTeam,
    away_team: ApiTeam,
    #[serde(default)]
    score: ApiScore,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTeam {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

impl ApiTeam {
    fn display_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .or(self.short_name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    #[serde(default)]
    full_time: ApiGoals,
    #[serde(default)]
    half_time: ApiGoals,
}

#[derive(Debug, Default, Deserialize)]
struct ApiGoals {
    home: Option<u32>,
    away: Option<u32>,
}

impl ApiGoals {
    fn pair(&self) -> Option<(u32, u32)> {
        Some((self.home?, self.away?))
    }
}

/// Finished matches in a competition payload. Rows without both full-time and
/// half-time scores, or with inconsistent halves, are dropped.
pub fn parse_matches_json(raw: &str, league: League) -> Result<Vec<MatchRecord>> {
    let Some(resp) = parse_response(raw)? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(resp.matches.len());
    for m in resp.matches {
        if FixtureStatus::from_api(&m.status) != FixtureStatus::Finished {
            continue;
        }
        let (Some(home), Some(away)) = (m.home_team.display_name(), m.away_team.display_name())
        else {
            continue;
        };
        let (Some(full), Some(first_half)) = (m.score.full_time.pair(), m.score.half_time.pair())
        else {
            continue;
        };
        let Some(kickoff) = parse_utc_date(&m.utc_date) else {
            warn!(league = league.code(), id = m.id, utc_date = %m.utc_date, "unparsable utcDate");
            continue;
        };
        match MatchRecord::try_new(home, away, full, first_half, kickoff.date()) {
            Ok(record) => out.push(record),
            Err(err) => warn!(league = league.code(), id = m.id, error = %err, "dropping match"),
        }
    }
    Ok(out)
}

pub fn parse_fixtures_json(raw: &str, league: League) -> Result<Vec<Fixture>> {
    let Some(resp) = parse_response(raw)? else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(resp.matches.len());
    for m in resp.matches {
        let (Some(home), Some(away)) = (m.home_team.display_name(), m.away_team.display_name())
        else {
            continue;
        };
        let Some(kickoff) = parse_utc_date(&m.utc_date) else {
            continue;
        };
        out.push(Fixture {
            id: m.id,
            league,
            home,
            away,
            kickoff,
            status: FixtureStatus::from_api(&m.status),
            score: m.score.full_time.pair(),
        });
    }
    Ok(out)
}

fn parse_response(raw: &str) -> Result<Option<MatchesResponse>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .context("invalid football-data json")
}

fn parse_utc_date(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%S"];
    let cleaned = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upcoming_url_carries_date_window() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        let url = fixtures_url(League::Brasileirao, FixtureQuery::Upcoming { today, days: 7 });
        assert!(url.ends_with(
            "/competitions/BSA/matches?status=SCHEDULED,TIMED&dateFrom=2024-12-30&dateTo=2025-01-06"
        ));
    }

    #[test]
    fn utc_date_formats() {
        assert!(parse_utc_date("2024-08-16T19:00:00Z").is_some());
        assert!(parse_utc_date("2024-08-16T19:00:00.000Z").is_some());
        assert!(parse_utc_date("16/08/2024").is_none());
    }
}
