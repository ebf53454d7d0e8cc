use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{error, info};

use h2h_terminal::config::{self, Config};
use h2h_terminal::logging;
use h2h_terminal::provider::{Provider, spawn_provider};
use h2h_terminal::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    demo_mode: bool,
}

impl App {
    fn new(config: &Config, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(
                config.leagues.clone(),
                config.recent_window,
                config.max_games_listed,
            ),
            should_quit: false,
            cmd_tx,
            demo_mode: config.live_api_key().is_none(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.enter() {
                    self.send(cmd);
                }
            }
            KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => self.state.back(),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Refreshing history");
                self.send(ProviderCommand::RefreshHistory);
            }
            KeyCode::Char('e') => match self.state.export_command() {
                Some(cmd) => self.send(cmd),
                None => self.state.push_log("[INFO] Open a report to export it"),
            },
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Provider not running");
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider stopped");
            self.cmd_tx = None;
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let log_line = logging::init_file();
    let config = Config::from_env();
    let demo = config.live_api_key().is_none();
    info!(
        demo,
        leagues = config.leagues.len(),
        "starting h2h_terminal"
    );

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let provider = Provider::from_config(&config)?;
    spawn_provider(provider, tx, cmd_rx, config.refresh_interval);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config, Some(cmd_tx));
    app.state.push_log(log_line);
    if demo {
        app.state
            .push_log("[INFO] Demo mode: set FOOTBALL_DATA_API_KEY for live data");
    }
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %err, "terminal loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Report => render_report(frame, chunks[1], &app.state),
        _ => render_menu(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let mode = if app.demo_mode { "DEMO" } else { "LIVE DATA" };
    format!(
        "  H2H TERMINAL | {mode}\n  {}",
        app.state.breadcrumb()
    )
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Competitions => "j/k/↑/↓ Move | Enter Select | r Refresh | ? Help | q Quit",
        Screen::Report => "j/k/↑/↓ Scroll | b/Esc Back | e Export | r Refresh | ? Help | q Quit",
        _ => "j/k/↑/↓ Move | Enter Select | b/Esc Back | r Refresh | ? Help | q Quit",
    }
    .to_string()
}

fn render_menu(frame: &mut Frame, area: Rect, state: &AppState) {
    let items = state.menu_items();
    if items.is_empty() {
        let msg = if state.screen == Screen::Fixtures && state.fixtures_loading {
            "Loading fixtures..."
        } else if state.screen == Screen::Fixtures {
            "No games found"
        } else {
            "Nothing to show"
        };
        frame.render_widget(Paragraph::new(msg), area);
        return;
    }

    let selected = state.selected_index();
    let visible = area.height as usize;
    let (start, end) = visible_range(selected, items.len(), visible);
    let lines: Vec<Line> = items[start..end]
        .iter()
        .enumerate()
        .map(|(offset, item)| {
            let idx = start + offset;
            if idx == selected {
                Line::styled(
                    format!("> {item}"),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Line::raw(format!("  {item}"))
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_report(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.report_loading {
        frame.render_widget(Paragraph::new("Computing stats..."), area);
        return;
    }
    let lines = state.report_lines();
    if lines.is_empty() {
        frame.render_widget(Paragraph::new("No report loaded"), area);
        return;
    }
    let max_scroll = lines.len().saturating_sub(area.height as usize) as u16;
    let report = Paragraph::new(lines.join("\n")).scroll((state.report_scroll.min(max_scroll), 0));
    frame.render_widget(report, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(4);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "H2H Terminal - Help",
        "",
        "Menus:",
        "  j/k or ↑/↓   Move",
        "  Enter        Select",
        "  b / Esc      Back",
        "",
        "Report:",
        "  j/k or ↑/↓   Scroll",
        "  e            Export to xlsx",
        "",
        "Global:",
        "  r            Refresh match history",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
