use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use h2h_terminal::fixture::FixtureStatus;
use h2h_terminal::football_data::{parse_fixtures_json, parse_matches_json};
use h2h_terminal::league::League;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_finished_matches_fixture() {
    let raw = read_fixture("fd_matches_finished.json");
    let rows = parse_matches_json(&raw, League::PremierLeague).expect("fixture should parse");

    // Postponed match skipped, Everton row dropped for a half-time score above full time.
    assert_eq!(rows.len(), 3);
    let first = &rows[0];
    assert_eq!(first.home_team, "Manchester United FC");
    assert_eq!(first.away_team, "Fulham FC");
    assert_eq!((first.goals_home_full, first.goals_away_full), (1, 0));
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 8, 16).unwrap());

    let arsenal = rows.iter().find(|m| m.home_team == "Arsenal FC").unwrap();
    assert_eq!(arsenal.goals_home_first_half, 1);
    assert_eq!(arsenal.goals_home_second_half(), 1);
    assert!(rows.iter().all(|m| m.home_team != "Everton FC"));
}

#[test]
fn parses_fixture_list_fixture() {
    let raw = read_fixture("fd_fixtures.json");
    let fixtures = parse_fixtures_json(&raw, League::PremierLeague).expect("fixture should parse");

    assert_eq!(fixtures.len(), 3);
    assert!(fixtures.iter().all(|f| f.league == League::PremierLeague));
    assert_eq!(fixtures[0].id, 497430);
    assert_eq!(fixtures[0].status, FixtureStatus::Timed);
    assert!(fixtures[0].score.is_none());

    let live = fixtures.iter().find(|f| f.is_live()).unwrap();
    assert_eq!(live.home, "Liverpool FC");
    assert_eq!(live.score, Some((0, 2)));
    assert_eq!(fixtures.iter().filter(|f| f.is_upcoming()).count(), 2);
}

#[test]
fn empty_and_null_payloads_yield_nothing() {
    assert!(parse_matches_json("", League::SerieA).unwrap().is_empty());
    assert!(parse_matches_json("null", League::SerieA).unwrap().is_empty());
    assert!(parse_fixtures_json("  null ", League::SerieA).unwrap().is_empty());
    assert!(parse_matches_json("{\"matches\": 3}", League::SerieA).is_err());
}
