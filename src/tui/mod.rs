//! Ratatui-based terminal UI.
//!
//! One form: a scrollable list of every feature on the left, the model tabs
//! and the latest outcome on the right. Submissions run on worker threads and
//! report back over a channel that the event loop drains every tick, so the
//! form stays responsive while a request is in flight.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use tracing::info;

use crate::api::PredictionClient;
use crate::app::pipeline::{self, PredictionOutcome};
use crate::domain::Tab;
use crate::error::{AppError, EXIT_RUNTIME};
use crate::features::{FeatureGenerator, FEATURE_COUNT};
use crate::state::{Completion, FormState};

const PAGE: usize = 10;

/// Start the TUI.
pub fn run(client: PredictionClient, mut generator: FeatureGenerator, tab: Tab) -> Result<(), AppError> {
    let features = generator.generate();
    info!(seed = ?generator.seed(), base_url = client.config().base_url(), "Starting interactive form");
    pipeline::spawn_health_probe(client.clone());

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(client, generator, FormState::new(features).with_tab(tab));
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                EXIT_RUNTIME,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    form: FormState,
    generator: FeatureGenerator,
    client: PredictionClient,
    selected: usize,
    /// Edit buffer while a value is being typed.
    editing: Option<String>,
    status: String,
    tx: Sender<PredictionOutcome>,
    rx: Receiver<PredictionOutcome>,
}

impl App {
    fn new(client: PredictionClient, generator: FeatureGenerator, form: FormState) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            form,
            generator,
            client,
            selected: 0,
            editing: None,
            status: "Ready.".to_string(),
            tx,
            rx,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_outcomes() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply every finished request. Returns true when something arrived.
    fn drain_outcomes(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(outcome) => {
                    let token = outcome.token;
                    changed = true;
                    match outcome.apply(&mut self.form) {
                        Completion::Applied if self.form.error().is_some() => {
                            self.status = format!("Request {token} failed.");
                        }
                        Completion::Applied => self.status = format!("Request {token} done."),
                        Completion::Stale => self.status = format!("Ignored stale response {token}."),
                    }
                }
                // `self.tx` keeps the channel open for the lifetime of the app.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.selected = step_selection(self.selected, -1, FEATURE_COUNT),
            KeyCode::Down => self.selected = step_selection(self.selected, 1, FEATURE_COUNT),
            KeyCode::PageUp => self.selected = step_selection(self.selected, -(PAGE as isize), FEATURE_COUNT),
            KeyCode::PageDown => self.selected = step_selection(self.selected, PAGE as isize, FEATURE_COUNT),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = FEATURE_COUNT - 1,
            KeyCode::Enter => {
                if let Some((spec, value)) = self.form.features().iter().nth(self.selected) {
                    self.editing = Some(value.to_string());
                    self.status = format!("Editing {}. Enter to apply, Esc to cancel.", spec.name);
                }
            }
            KeyCode::Tab => self.switch_tab(self.form.active_tab().next()),
            KeyCode::Char('1') => self.switch_tab(Tab::Primary),
            KeyCode::Char('2') => self.switch_tab(Tab::Los),
            KeyCode::Char('g') => {
                self.form.regenerate(&mut self.generator);
                self.status = "Generated new values.".to_string();
            }
            KeyCode::Char('s') => self.submit(),
            KeyCode::Char('d') => {
                match crate::debug::write_debug_bundle(&self.form, self.client.config()) {
                    Ok(path) => self.status = format!("Wrote debug bundle: {}", path.display()),
                    Err(err) => self.status = format!("Debug write failed: {err}"),
                }
            }
            _ => {}
        }
        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let raw = std::mem::take(buffer);
                self.editing = None;
                self.apply_edit(&raw);
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    fn apply_edit(&mut self, raw: &str) {
        let Some(key) = self.form.features().keys().nth(self.selected) else {
            return;
        };
        match self.form.set_feature_value(key, raw) {
            Ok(()) => {
                let shown = self
                    .form
                    .features()
                    .get(key)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                self.status = format!("{key} = {shown}");
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.form.select_tab(tab);
        self.status = format!("Target: {} ({})", tab.display_name(), tab.endpoint());
    }

    fn submit(&mut self) {
        let request = self.form.submit();
        self.status = format!("Submitted {} to {}.", request.token, request.tab.endpoint());
        pipeline::spawn_prediction(self.client.clone(), request, self.tx.clone());
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let seed = self
            .generator
            .seed()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string());
        let lines = vec![
            Line::from(vec![
                Span::styled("model-tester", Style::default().fg(Color::Cyan)),
                Span::raw(" - ICU prediction model tester"),
            ]),
            Line::from(Span::styled(
                format!(
                    "api: {} | seed: {seed} | features: {}",
                    self.client.config().base_url(),
                    self.form.features().len()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_features(frame, chunks[0]);
        self.draw_outcome(frame, chunks[1]);
    }

    fn draw_features(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let label_width = area.width.saturating_sub(6) as usize / 2;
        let items: Vec<ListItem> = self
            .form
            .features()
            .iter()
            .enumerate()
            .map(|(i, (spec, value))| {
                let shown = match &self.editing {
                    Some(buffer) if i == self.selected => format!("{buffer}_"),
                    _ => value.to_string(),
                };
                ListItem::new(format!("{:<label_width$} {shown}", spec.label()))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Features").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_outcome(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.display_name())))
            .collect();
        let selected = Tab::ALL
            .iter()
            .position(|tab| *tab == self.form.active_tab())
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().title("Model").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        let text = crate::report::format_outcome(&self.form);
        let style = if self.form.is_loading() {
            Style::default().fg(Color::Yellow)
        } else if self.form.error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        let body = if text.is_empty() {
            Paragraph::new("Press s to submit.").style(Style::default().fg(Color::Gray))
        } else {
            Paragraph::new(text).style(style)
        };
        frame.render_widget(
            body.wrap(Wrap { trim: false })
                .block(Block::default().title("Outcome").borders(Borders::ALL)),
            chunks[1],
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.editing.is_some() {
            "type value  Enter apply  Esc cancel"
        } else {
            "↑/↓ PgUp/PgDn select  Enter edit  Tab/1/2 model  g generate  s submit  d debug  q quit"
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Move a list cursor by `delta`, clamped to `0..len`.
fn step_selection(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}
