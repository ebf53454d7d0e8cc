use std::time::Duration;

use chrono::NaiveDate;

use h2h_terminal::config::Config;
use h2h_terminal::demo_feed::DemoSource;
use h2h_terminal::history_store::SqliteHistory;
use h2h_terminal::league::League;
use h2h_terminal::provider::Provider;
use h2h_terminal::report::NO_DATA_LINE;
use h2h_terminal::state::{
    AppState, Delta, FixtureView, ProviderCommand, ReportKind, Screen, apply_delta,
};

fn demo_provider(leagues: Vec<League>) -> Provider {
    let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    Provider::new(
        SqliteHistory::open_in_memory().unwrap(),
        Box::new(DemoSource::with_today(5, today)),
        leagues,
        Duration::from_secs(3600),
        2,
    )
}

fn run(state: &mut AppState, provider: &Provider, cmd: Option<ProviderCommand>) {
    let cmd = cmd.expect("screen should request data");
    for delta in provider.handle(cmd) {
        apply_delta(state, delta);
    }
}

#[test]
fn walks_the_menu_tree_to_a_report() {
    let leagues = vec![League::PremierLeague, League::SerieA];
    let provider = demo_provider(leagues.clone());
    for delta in provider.refresh() {
        assert!(matches!(delta, Delta::Log(ref msg) if msg.starts_with("[INFO]")));
    }

    let mut state = AppState::new(leagues, 10, 30);
    assert_eq!(state.menu_items().len(), 2);
    state.select_next();
    state.select_next();
    assert_eq!(state.selected_league(), Some(League::SerieA));

    assert!(state.enter().is_none());
    assert_eq!(state.screen, Screen::FixtureStatus);
    assert_eq!(state.menu_items(), vec!["Upcoming", "Live"]);

    let cmd = state.enter();
    assert!(matches!(
        cmd,
        Some(ProviderCommand::FetchFixtures {
            league: League::SerieA,
            view: FixtureView::Upcoming
        })
    ));
    assert!(state.fixtures_loading);
    run(&mut state, &provider, cmd);
    assert!(!state.fixtures_loading);
    assert_eq!(state.fixtures.len(), 4);
    assert!(state.fixtures.windows(2).all(|w| w[0].kickoff <= w[1].kickoff));

    assert!(state.enter().is_none());
    assert_eq!(state.screen, Screen::Actions);
    assert!(state.enter().is_none());
    assert_eq!(state.screen, Screen::Filters);
    assert_eq!(state.menu_items().len(), 2);

    let cmd = state.enter();
    assert_eq!(state.screen, Screen::Report);
    run(&mut state, &provider, cmd);
    let report = state.report.as_ref().expect("report should load");
    assert_eq!(report.league, League::SerieA);
    assert_eq!(report.home.team, state.fixtures[0].home);
    // Each demo team plays 14 games; window is 10.
    assert_eq!(report.home.snapshot.total(), 10);
    assert_eq!(report.away.snapshot.total(), 10);

    let lines = state.report_lines();
    assert!(lines[0].contains("Serie A"));
    assert!(state.breadcrumb().ends_with("Last 10 overall"));

    assert!(matches!(
        state.export_command(),
        Some(ProviderCommand::ExportReport { .. })
    ));

    state.back();
    assert_eq!(state.screen, Screen::Filters);
    state.back();
    state.select_next();
    assert_eq!(state.selected_report_kind(), ReportKind::Recent);
}

#[test]
fn recent_results_report_lists_newest_first() {
    let provider = demo_provider(vec![League::Ligue1]);
    provider.refresh();

    let mut state = AppState::new(vec![League::Ligue1], 5, 30);
    state.enter();
    let cmd = state.enter();
    run(&mut state, &provider, cmd);
    state.enter();
    state.select_next();
    assert_eq!(state.selected_report_kind(), ReportKind::Recent);
    state.enter();
    state.select_next();
    let cmd = state.enter();
    run(&mut state, &provider, cmd);

    let report = state.report.as_ref().unwrap();
    assert_eq!(report.preset.label, "Last 5 (home at home vs away away)");
    assert!(report.home.recent.iter().all(|m| m.is_home));
    assert!(report.away.recent.iter().all(|m| !m.is_home));
    assert!(report.home.recent.len() <= 5);

    let lines = state.report_lines();
    let first_home_line = &lines[3];
    let newest = report.home.recent.last().unwrap().render();
    assert_eq!(first_home_line, &newest);
}

#[test]
fn stale_and_failed_answers_are_handled() {
    let mut state = AppState::new(vec![League::LaLiga, League::Bundesliga], 10, 2);
    state.enter();
    state.select_next();
    let provider = demo_provider(vec![League::LaLiga]);
    let cmd = state.enter();
    assert!(matches!(
        cmd,
        Some(ProviderCommand::FetchFixtures {
            view: FixtureView::Live,
            ..
        })
    ));
    run(&mut state, &provider, cmd);
    assert_eq!(state.fixtures.len(), 1);
    assert!(state.fixtures[0].is_live());

    // Answer for a league the user is not looking at.
    apply_delta(
        &mut state,
        Delta::SetFixtures {
            league: League::Bundesliga,
            view: FixtureView::Live,
            fixtures: Vec::new(),
        },
    );
    assert_eq!(state.fixtures.len(), 1);

    apply_delta(
        &mut state,
        Delta::FixturesFailed {
            league: League::LaLiga,
            error: "boom".to_string(),
        },
    );
    assert!(state.logs.back().unwrap().contains("boom"));

    // The league has no stored history yet: the store answers with an empty list.
    state.enter();
    state.enter();
    let cmd = state.enter();
    run(&mut state, &provider, cmd);
    let report = state.report.as_ref().unwrap();
    assert_eq!(report.home.snapshot.total(), 0);
    assert!(state.report_lines().iter().any(|l| l == NO_DATA_LINE));
}

#[test]
fn fixture_list_is_capped() {
    let provider = demo_provider(vec![League::PremierLeague]);
    let mut state = AppState::new(vec![League::PremierLeague], 10, 2);
    state.enter();
    let cmd = state.enter();
    run(&mut state, &provider, cmd);
    assert_eq!(state.fixtures.len(), 2);
    assert_eq!(state.menu_items().len(), 2);
}

#[test]
fn old_report_failure_does_not_end_a_newer_wait() {
    let provider = demo_provider(vec![League::Eredivisie]);
    let mut state = AppState::new(vec![League::Eredivisie], 10, 30);
    state.enter();
    let cmd = state.enter();
    run(&mut state, &provider, cmd);
    state.enter();
    state.enter();
    let cmd = state.enter();
    let Some(ProviderCommand::BuildReport { home, away, .. }) = cmd else {
        panic!("filters screen should request a report");
    };
    assert!(state.report_loading);

    // The user first asked for the other preset, then changed their mind.
    let preset = state.presets[1].clone();
    apply_delta(
        &mut state,
        Delta::ReportFailed {
            league: League::Eredivisie,
            home: home.clone(),
            away: away.clone(),
            preset,
            error: "db locked".to_string(),
        },
    );
    assert!(state.report_loading);
    assert!(state.logs.back().unwrap().contains("db locked"));

    let preset = state.presets[0].clone();
    apply_delta(
        &mut state,
        Delta::ReportFailed {
            league: League::Eredivisie,
            home,
            away,
            preset,
            error: "db locked".to_string(),
        },
    );
    assert!(!state.report_loading);
    assert!(state.report.is_none());
}

#[test]
fn live_provider_without_cache_dir_uses_memory() {
    let config = Config {
        api_key: Some("key".to_string()),
        db_path: None,
        leagues: vec![League::PremierLeague],
        ..Config::default()
    };
    assert_eq!(config.live_api_key(), Some("key"));
    assert!(Provider::from_config(&config).is_ok());

    let demo = Config {
        demo_mode: true,
        ..config
    };
    assert_eq!(demo.live_api_key(), None);
    assert!(Provider::from_config(&demo).is_ok());
}
