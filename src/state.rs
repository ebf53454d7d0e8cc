use std::collections::VecDeque;

use crate::fixture::{Fixture, limit_fixtures};
use crate::league::League;
use crate::report::{MatchupPreset, MatchupReport, default_presets};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Competitions,
    FixtureStatus,
    Fixtures,
    Actions,
    Filters,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureView {
    Upcoming,
    Live,
}

impl FixtureView {
    pub const ALL: [FixtureView; 2] = [FixtureView::Upcoming, FixtureView::Live];

    pub fn label(self) -> &'static str {
        match self {
            FixtureView::Upcoming => "Upcoming",
            FixtureView::Live => "Live",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Stats,
    Recent,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Stats, ReportKind::Recent];

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Stats => "Matchup stats",
            ReportKind::Recent => "Recent results",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchFixtures {
        league: League,
        view: FixtureView,
    },
    BuildReport {
        league: League,
        home: String,
        away: String,
        preset: MatchupPreset,
    },
    RefreshHistory,
    ExportReport {
        path: String,
        report: Box<MatchupReport>,
    },
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetFixtures {
        league: League,
        view: FixtureView,
        fixtures: Vec<Fixture>,
    },
    FixturesFailed {
        league: League,
        error: String,
    },
    SetReport(Box<MatchupReport>),
    ReportFailed {
        league: League,
        home: String,
        away: String,
        preset: MatchupPreset,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub leagues: Vec<League>,
    pub league_selected: usize,
    pub view_selected: usize,
    pub fixtures: Vec<Fixture>,
    pub fixtures_loading: bool,
    pub fixture_selected: usize,
    pub action_selected: usize,
    pub presets: Vec<MatchupPreset>,
    pub preset_selected: usize,
    pub report: Option<MatchupReport>,
    pub report_loading: bool,
    pub report_scroll: u16,
    pub max_games_listed: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(leagues: Vec<League>, recent_window: usize, max_games_listed: usize) -> Self {
        Self {
            screen: Screen::Competitions,
            leagues,
            league_selected: 0,
            view_selected: 0,
            fixtures: Vec::new(),
            fixtures_loading: false,
            fixture_selected: 0,
            action_selected: 0,
            presets: default_presets(recent_window),
            preset_selected: 0,
            report: None,
            report_loading: false,
            report_scroll: 0,
            max_games_listed,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn selected_league(&self) -> Option<League> {
        self.leagues.get(self.league_selected).copied()
    }

    pub fn selected_view(&self) -> FixtureView {
        FixtureView::ALL[self.view_selected.min(FixtureView::ALL.len() - 1)]
    }

    pub fn selected_fixture(&self) -> Option<&Fixture> {
        self.fixtures.get(self.fixture_selected)
    }

    pub fn selected_report_kind(&self) -> ReportKind {
        ReportKind::ALL[self.action_selected.min(ReportKind::ALL.len() - 1)]
    }

    pub fn selected_preset(&self) -> Option<&MatchupPreset> {
        self.presets.get(self.preset_selected)
    }

    fn menu_len(&self) -> usize {
        match self.screen {
            Screen::Competitions => self.leagues.len(),
            Screen::FixtureStatus => FixtureView::ALL.len(),
            Screen::Fixtures => self.fixtures.len(),
            Screen::Actions => ReportKind::ALL.len(),
            Screen::Filters => self.presets.len(),
            Screen::Report => 0,
        }
    }

    fn cursor_mut(&mut self) -> Option<&mut usize> {
        match self.screen {
            Screen::Competitions => Some(&mut self.league_selected),
            Screen::FixtureStatus => Some(&mut self.view_selected),
            Screen::Fixtures => Some(&mut self.fixture_selected),
            Screen::Actions => Some(&mut self.action_selected),
            Screen::Filters => Some(&mut self.preset_selected),
            Screen::Report => None,
        }
    }

    pub fn select_next(&mut self) {
        if self.screen == Screen::Report {
            self.report_scroll = self.report_scroll.saturating_add(1);
            return;
        }
        let len = self.menu_len();
        if let Some(cursor) = self.cursor_mut()
            && len > 0
        {
            *cursor = (*cursor + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        if self.screen == Screen::Report {
            self.report_scroll = self.report_scroll.saturating_sub(1);
            return;
        }
        if let Some(cursor) = self.cursor_mut() {
            *cursor = cursor.saturating_sub(1);
        }
    }

    /// Moves one level down the menu tree; returns the fetch the new screen needs.
    pub fn enter(&mut self) -> Option<ProviderCommand> {
        match self.screen {
            Screen::Competitions => {
                self.selected_league()?;
                self.view_selected = 0;
                self.screen = Screen::FixtureStatus;
                None
            }
            Screen::FixtureStatus => {
                let league = self.selected_league()?;
                let view = self.selected_view();
                self.fixtures.clear();
                self.fixture_selected = 0;
                self.fixtures_loading = true;
                self.screen = Screen::Fixtures;
                Some(ProviderCommand::FetchFixtures { league, view })
            }
            Screen::Fixtures => {
                self.selected_fixture()?;
                self.action_selected = 0;
                self.screen = Screen::Actions;
                None
            }
            Screen::Actions => {
                self.preset_selected = 0;
                self.screen = Screen::Filters;
                None
            }
            Screen::Filters => {
                let league = self.selected_league()?;
                let fixture = self.selected_fixture()?.clone();
                let preset = self.selected_preset()?.clone();
                self.report = None;
                self.report_loading = true;
                self.report_scroll = 0;
                self.screen = Screen::Report;
                Some(ProviderCommand::BuildReport {
                    league,
                    home: fixture.home,
                    away: fixture.away,
                    preset,
                })
            }
            Screen::Report => None,
        }
    }

    pub fn back(&mut self) {
        self.screen = match self.screen {
            Screen::Competitions | Screen::FixtureStatus => Screen::Competitions,
            Screen::Fixtures => Screen::FixtureStatus,
            Screen::Actions => Screen::Fixtures,
            Screen::Filters => Screen::Actions,
            Screen::Report => Screen::Filters,
        };
    }

    /// Lines for the report screen in the currently selected kind.
    pub fn report_lines(&self) -> Vec<String> {
        let Some(report) = &self.report else {
            return Vec::new();
        };
        match self.selected_report_kind() {
            ReportKind::Stats => report.render(),
            ReportKind::Recent => report.render_recent(),
        }
    }

    pub fn selected_index(&self) -> usize {
        match self.screen {
            Screen::Competitions => self.league_selected,
            Screen::FixtureStatus => self.view_selected,
            Screen::Fixtures => self.fixture_selected,
            Screen::Actions => self.action_selected,
            Screen::Filters => self.preset_selected,
            Screen::Report => 0,
        }
    }

    /// Entries of the current menu; on the report screen, the report itself.
    pub fn menu_items(&self) -> Vec<String> {
        match self.screen {
            Screen::Competitions => self
                .leagues
                .iter()
                .map(|l| format!("{} ({})", l.label(), l.code()))
                .collect(),
            Screen::FixtureStatus => FixtureView::ALL
                .iter()
                .map(|v| v.label().to_string())
                .collect(),
            Screen::Fixtures => self.fixtures.iter().map(Fixture::display_line).collect(),
            Screen::Actions => ReportKind::ALL
                .iter()
                .map(|k| k.label().to_string())
                .collect(),
            Screen::Filters => self.presets.iter().map(|p| p.label.clone()).collect(),
            Screen::Report => self.report_lines(),
        }
    }

    pub fn breadcrumb(&self) -> String {
        let mut parts = vec!["Competitions".to_string()];
        if self.screen == Screen::Competitions {
            return parts.join(" > ");
        }
        if let Some(league) = self.selected_league() {
            parts.push(league.label().to_string());
        }
        if self.screen != Screen::FixtureStatus {
            parts.push(self.selected_view().label().to_string());
        }
        if matches!(self.screen, Screen::Actions | Screen::Filters | Screen::Report)
            && let Some(f) = self.selected_fixture()
        {
            parts.push(format!("{} vs {}", f.home, f.away));
        }
        if matches!(self.screen, Screen::Filters | Screen::Report) {
            parts.push(self.selected_report_kind().label().to_string());
        }
        if self.screen == Screen::Report
            && let Some(p) = self.selected_preset()
        {
            parts.push(p.label.clone());
        }
        parts.join(" > ")
    }

    /// Export command for the report on screen, if one is loaded.
    pub fn export_command(&self) -> Option<ProviderCommand> {
        if self.screen != Screen::Report {
            return None;
        }
        let report = self.report.as_ref()?;
        let path = format!(
            "h2h_{}_{}.xlsx",
            file_slug(&report.home.team),
            file_slug(&report.away.team)
        );
        Some(ProviderCommand::ExportReport {
            path,
            report: Box::new(report.clone()),
        })
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn report_selected(&self, league: League, home: &str, away: &str, preset: &MatchupPreset) -> bool {
        let (Some(selected), Some(fixture), Some(selected_preset)) = (
            self.selected_league(),
            self.selected_fixture(),
            self.selected_preset(),
        ) else {
            return false;
        };
        selected == league && fixture.home == home && fixture.away == away && selected_preset == preset
    }
}

fn file_slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetFixtures {
            league,
            view,
            fixtures,
        } => {
            // Ignore answers for a menu the user already left.
            if state.selected_league() != Some(league) || state.selected_view() != view {
                return;
            }
            state.fixtures = limit_fixtures(fixtures, state.max_games_listed);
            state.fixtures_loading = false;
            state.fixture_selected = state
                .fixture_selected
                .min(state.fixtures.len().saturating_sub(1));
        }
        Delta::FixturesFailed { league, error } => {
            if state.selected_league() == Some(league) {
                state.fixtures_loading = false;
            }
            state.push_log(format!("[WARN] {} fixtures: {error}", league.code()));
        }
        Delta::SetReport(report) => {
            if !state.report_selected(report.league, &report.home.team, &report.away.team, &report.preset) {
                return;
            }
            state.report = Some(*report);
            state.report_loading = false;
        }
        Delta::ReportFailed {
            league,
            home,
            away,
            preset,
            error,
        } => {
            // A failure for an older request must not end a newer one's wait.
            if state.report_selected(league, &home, &away, &preset) {
                state.report_loading = false;
            }
            state.push_log(format!("[WARN] Report {home} vs {away} failed: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
