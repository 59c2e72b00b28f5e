use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use ratatui::Terminal;

use crate::config::{AppConfig, ConfigLoader};
use crate::feed::{FeedRuntime, RecordFeed};
use crate::records::{Period, RecordSource};
use crate::ui;

pub mod state;

pub use state::{AppState, SortColumn, SortDirection};

enum Action {
    Quit,
    Refresh,
    SelectNext,
    SelectPrevious,
    SetPeriod(Period),
    CycleSort,
    ToggleSortDirection,
    ToggleExcludeEmpty,
    CycleVersionFilter,
    ToggleTheme,
    StartSearch,
}

pub struct App {
    config: AppConfig,
    loader: ConfigLoader,
    feed: RecordFeed,
    runtime: FeedRuntime,
    state: AppState,
    table_state: TableState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(
        config: AppConfig,
        loader: ConfigLoader,
        source: Box<dyn RecordSource>,
    ) -> Result<Self> {
        let runtime = FeedRuntime::spawn(source).context("starting record fetch runtime")?;
        let mut feed = RecordFeed::new(config.default_period);

        // Mount fetch: the feed goes straight into loading for the
        // configured period.
        if let Some(request) = feed.refresh() {
            runtime.dispatch(request);
        }

        let state = AppState::new(feed.snapshot(), config.theme);
        let tick_rate = Duration::from_millis(config.tick_rate_ms);
        Ok(Self {
            config,
            loader,
            feed,
            runtime,
            state,
            table_state: TableState::default(),
            should_quit: false,
            tick_rate,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    ui::draw_app(frame, &self.state, &mut self.table_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Drains fetch responses and folds them into the feed. Runs every
    /// tick; the feed discards anything stale.
    fn on_tick(&mut self) {
        let mut changed = false;
        for response in self.runtime.drain() {
            changed |= self.feed.apply(response);
        }
        if !changed {
            return;
        }
        let snapshot = self.feed.snapshot();
        if let Some(error) = &snapshot.error {
            self.state.set_status_message(Some(format!(
                "Failed to index records: {error} (press r to retry)"
            )));
        }
        self.state.absorb(snapshot);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.state.search.active {
            match key.code {
                KeyCode::Esc => {
                    self.state.cancel_search();
                    return;
                }
                KeyCode::Enter => {
                    self.state.finish_search();
                    return;
                }
                KeyCode::Backspace => {
                    self.state.pop_search_char();
                    return;
                }
                KeyCode::Char(ch)
                    if !key.modifiers.intersects(
                        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                    ) =>
                {
                    self.state.push_search_char(ch);
                    return;
                }
                _ => {}
            }
        }

        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('1') => Some(Action::SetPeriod(Period::Today)),
            KeyCode::Char('2') => Some(Action::SetPeriod(Period::Yesterday)),
            KeyCode::Char('3') => Some(Action::SetPeriod(Period::Week)),
            KeyCode::Char('4') => Some(Action::SetPeriod(Period::Month)),
            KeyCode::Char('5') => Some(Action::SetPeriod(Period::All)),
            KeyCode::Char('s') => Some(Action::CycleSort),
            KeyCode::Char('S') => Some(Action::ToggleSortDirection),
            KeyCode::Char('f') => Some(Action::ToggleExcludeEmpty),
            KeyCode::Char('v') => Some(Action::CycleVersionFilter),
            KeyCode::Char('t') => Some(Action::ToggleTheme),
            KeyCode::Char('/') => Some(Action::StartSearch),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::Refresh => self.handle_refresh(),
            Action::SetPeriod(period) => self.handle_set_period(period),
            Action::CycleSort => {
                self.state.cycle_sort();
                self.state
                    .set_status_message(Some(format!("Sorting by {}", self.state.sort.title())));
            }
            Action::ToggleSortDirection => {
                self.state.toggle_sort_direction();
            }
            Action::ToggleExcludeEmpty => self.handle_toggle_exclude_empty(),
            Action::CycleVersionFilter => {
                self.state.cycle_version_filter();
                let message = match &self.state.version_filter {
                    Some(version) => format!("Showing version {version}"),
                    None => "Showing all versions".to_string(),
                };
                self.state.set_status_message(Some(message));
            }
            Action::ToggleTheme => self.handle_toggle_theme(),
            Action::StartSearch => {
                self.state.begin_search();
                self.state
                    .set_status_message(Some("Search world names: type to filter • Enter keep • Esc clear"));
            }
        }
    }

    fn handle_refresh(&mut self) {
        match self.feed.refresh() {
            Some(request) => {
                self.runtime.dispatch(request);
                self.state.set_status_message(Some(format!(
                    "Updating {}…",
                    self.feed.period().label()
                )));
            }
            None => {
                // coalesced into the in-flight fetch
                self.state
                    .set_status_message(Some("Update already in progress"));
            }
        }
        self.state.absorb(self.feed.snapshot());
    }

    fn handle_set_period(&mut self, period: Period) {
        let request = self.feed.set_period(period);
        self.runtime.dispatch(request);
        self.state
            .set_status_message(Some(format!("Loading {}…", period.label())));
        self.state.absorb(self.feed.snapshot());
    }

    fn handle_toggle_exclude_empty(&mut self) {
        match self.state.toggle_exclude_empty() {
            Some(true) => {
                self.state.set_status_message(Some(format!(
                    "Hiding runs without a {} split",
                    self.state.sort.title()
                )));
            }
            Some(false) => {
                self.state.set_status_message(Some(format!(
                    "Showing runs without a {} split",
                    self.state.sort.title()
                )));
            }
            None => {
                self.state.set_status_message(Some(
                    "Exclude-empty applies to split columns; sort one with s first",
                ));
            }
        }
    }

    fn handle_toggle_theme(&mut self) {
        let theme = self.state.toggle_theme();
        self.config.theme = theme;
        match self.loader.save(&self.config) {
            Ok(()) => {
                self.state
                    .set_status_message(Some(format!("Theme: {}", theme.label())));
            }
            Err(err) => {
                tracing::error!(?err, "failed to persist theme change");
                self.state
                    .set_status_message(Some("Theme changed, but saving the config failed"));
            }
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
