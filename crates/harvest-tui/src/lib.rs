// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use harvest_app::{
    AppCommand, AppEvent, AppState, DEFAULT_PAGE_SIZE, ENTRIES_LOAD_FAILED_MESSAGE, Entry,
    EntryListing, ListView, LoginFormInput, NotesFormInput, RUNS_LOAD_FAILED_MESSAGE,
    RenameFormInput, Run, RunId, RunListing, RunSortField, RunStats, SCRAPE_BUSY_MESSAGE, Screen,
    ScrapeFormInput, ScrapeOutcome, ScrapeResult, TagsFormInput, User, ViewCommand, ViewEvent,
    empty_entries_message, empty_runs_message, page_indicator, process_entries, process_runs,
    showing_line, suggested_tags, timefmt,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Sheet,
    Print,
}

impl ExportKind {
    const fn verb(self) -> &'static str {
        match self {
            Self::Sheet => "exported",
            Self::Print => "print file written to",
        }
    }
}

/// What an export covers: the filtered, sorted working set of a listing.
#[derive(Debug, Clone, Copy)]
pub enum ExportTarget<'a> {
    Runs(&'a [&'a Run]),
    Entries {
        run: &'a Run,
        entries: &'a [&'a Entry],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub page_size: usize,
    pub default_pages: u32,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_pages: 1,
        }
    }
}

pub trait AppRuntime {
    fn login(&mut self, username: &str, password: &str) -> Result<Option<User>>;
    fn load_runs(&mut self) -> Result<Vec<Run>>;
    fn load_entries(&mut self, run_id: RunId) -> Result<Vec<Entry>>;
    fn rename_run(&mut self, run_id: RunId, name: &str) -> Result<()>;
    fn delete_run(&mut self, run_id: RunId) -> Result<()>;
    fn update_notes(&mut self, run_id: RunId, notes: &str) -> Result<()>;
    fn update_tags(&mut self, run_id: RunId, tags: &[String]) -> Result<()>;
    fn export(&mut self, kind: ExportKind, target: ExportTarget<'_>) -> Result<PathBuf>;
    /// Saves the backend's own CSV for every run (`None`) or for one run.
    fn download_csv(&mut self, run_id: Option<RunId>) -> Result<PathBuf>;
    fn run_scrape(&mut self, pages: u32) -> Result<ScrapeOutcome>;
    fn spawn_scrape(&mut self, pages: u32, tx: Sender<InternalEvent>) -> Result<()> {
        let result = match self.run_scrape(pages) {
            Ok(outcome) => ScrapeResult::Succeeded(outcome),
            Err(error) => {
                warn!(pages, error = %format!("{error:#}"), "scrape failed");
                ScrapeResult::Failed
            }
        };
        tx.send(InternalEvent::Scrape(result))
            .map_err(|_| anyhow!("scrape event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Scrape(ScrapeResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct LoginUiState {
    username: String,
    password: String,
    field: LoginField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Search,
    StartDate,
    EndDate,
    JumpPage,
    ScrapePages,
    Rename(RunId),
    Notes(RunId),
    Tags(RunId),
    ConfirmDelete(RunId),
}

impl PromptKind {
    const fn title(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::StartDate => "from date (YYYY-MM-DD, empty clears)",
            Self::EndDate => "to date (YYYY-MM-DD, empty clears)",
            Self::JumpPage => "jump to page",
            Self::ScrapePages => "pages to scrape",
            Self::Rename(_) => "rename run",
            Self::Notes(_) => "notes",
            Self::Tags(_) => "tags (comma separated)",
            Self::ConfirmDelete(_) => "delete run",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptState {
    kind: PromptKind,
    input: String,
    /// Display name of the run a write prompt targets.
    subject: Option<String>,
}

impl PromptState {
    fn new(kind: PromptKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            subject: None,
        }
    }

    fn about(mut self, run: &Run) -> Self {
        self.subject = Some(run.display_name());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    options: UiOptions,
    login: LoginUiState,
    runs: Vec<Run>,
    runs_load_failed: bool,
    runs_view: ListView,
    runs_cursor: usize,
    current_run: Option<Run>,
    entries: Vec<Entry>,
    entries_load_failed: bool,
    entries_view: ListView,
    entries_cursor: usize,
    prompt: Option<PromptState>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            options,
            runs_view: ListView::with_page_size(options.page_size),
            entries_view: ListView::with_page_size(options.page_size),
            ..Self::default()
        }
    }

    fn run_listing(&self) -> RunListing<'_> {
        process_runs(&self.runs, &self.runs_view.query())
    }

    fn entry_listing(&self) -> EntryListing<'_> {
        process_entries(
            &self.entries,
            &self.entries_view.search,
            self.entries_view.page,
            self.entries_view.page_size,
        )
    }

    fn selected_run(&self) -> Option<Run> {
        let listing = self.run_listing();
        listing
            .visible(self.runs_view.page_size)
            .get(self.runs_cursor)
            .copied()
            .cloned()
    }

    fn selected_entry(&self) -> Option<&Entry> {
        let listing = self.entry_listing();
        listing
            .visible(self.entries_view.page_size)
            .get(self.entries_cursor)
            .copied()
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    if state.session.is_signed_in() {
        enter_runs_screen(state, runtime, &mut view_data, &internal_tx);
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let key = match next_key(event::poll, event::read) {
            Ok(Some(key)) => key,
            Ok(None) => continue,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Waits one poll interval for input. Errors come back as values so the
/// caller can restore the terminal before reporting them.
fn next_key(
    poll: impl FnOnce(Duration) -> io::Result<bool>,
    read: impl FnOnce() -> io::Result<Event>,
) -> Result<Option<KeyEvent>> {
    if !poll(POLL_INTERVAL).context("poll event")? {
        return Ok(None);
    }
    match read().context("read event")? {
        Event::Key(key) => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Scrape(result) => {
                let events = dispatch(state, view_data, tx, AppCommand::FinishScrape(result));
                if events.contains(&AppEvent::RunsInvalidated) && state.screen == Screen::Runs {
                    reload_runs(state, runtime, view_data, tx);
                }
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(state, view_data, internal_tx, AppCommand::SetStatus(message.into()));
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) -> Vec<AppEvent> {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
    events
}

fn report_failure(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: &str,
    error: &anyhow::Error,
) {
    warn!(action, error = %format!("{error:#}"), "request failed");
    emit_status(state, view_data, internal_tx, format!("{action} failed: {error:#}"));
}

fn enter_runs_screen<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    dispatch(state, view_data, internal_tx, AppCommand::OpenRuns);
    if state.screen != Screen::Runs {
        return;
    }
    view_data.runs_view = ListView::with_page_size(view_data.options.page_size);
    view_data.runs_cursor = 0;
    view_data.current_run = None;
    view_data.entries.clear();
    reload_runs(state, runtime, view_data, internal_tx);
}

fn enter_entries_screen<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    run: Run,
) {
    dispatch(state, view_data, internal_tx, AppCommand::OpenEntries(run.id));
    if state.screen != Screen::Entries(run.id) {
        return;
    }
    view_data.entries_view = ListView::with_page_size(view_data.options.page_size);
    view_data.entries_cursor = 0;
    view_data.entries.clear();
    view_data.current_run = Some(run);
    reload_entries(state, runtime, view_data, internal_tx);
}

/// Returns whether the backend answered.
fn reload_runs<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    match runtime.load_runs() {
        Ok(runs) => {
            view_data.runs = runs;
            view_data.runs_load_failed = false;
            let total = view_data.run_listing().total_pages;
            view_data.runs_view.settle(total);
            clamp_runs_cursor(view_data);
            true
        }
        Err(error) => {
            view_data.runs_load_failed = true;
            report_failure(state, view_data, internal_tx, "load runs", &error);
            false
        }
    }
}

fn reload_entries<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    let Screen::Entries(run_id) = state.screen else {
        return false;
    };
    match runtime.load_entries(run_id) {
        Ok(entries) => {
            view_data.entries = entries;
            view_data.entries_load_failed = false;
            let total = view_data.entry_listing().total_pages;
            view_data.entries_view.settle(total);
            clamp_entries_cursor(view_data);
            true
        }
        Err(error) => {
            view_data.entries_load_failed = true;
            report_failure(state, view_data, internal_tx, "load entries", &error);
            false
        }
    }
}

fn clamp_runs_cursor(view_data: &mut ViewData) {
    let visible = view_data
        .run_listing()
        .visible(view_data.runs_view.page_size)
        .len();
    view_data.runs_cursor = view_data.runs_cursor.min(visible.saturating_sub(1));
}

fn clamp_entries_cursor(view_data: &mut ViewData) {
    let visible = view_data
        .entry_listing()
        .visible(view_data.entries_view.page_size)
        .len();
    view_data.entries_cursor = view_data.entries_cursor.min(visible.saturating_sub(1));
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match state.screen {
        Screen::Login => handle_login_key(state, runtime, view_data, internal_tx, key),
        Screen::Runs => handle_runs_key(state, runtime, view_data, internal_tx, key),
        Screen::Entries(_) => handle_entries_key(state, runtime, view_data, internal_tx, key),
    }
    false
}

fn handle_login_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let login = &mut view_data.login;
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            login.field = match login.field {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }
        KeyCode::Backspace => {
            match login.field {
                LoginField::Username => login.username.pop(),
                LoginField::Password => login.password.pop(),
            };
        }
        KeyCode::Enter => {
            if login.field == LoginField::Username && login.password.is_empty() {
                login.field = LoginField::Password;
                return;
            }
            submit_login(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char(ch) => match login.field {
            LoginField::Username => login.username.push(ch),
            LoginField::Password => login.password.push(ch),
        },
        _ => {}
    }
}

fn submit_login<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let input = LoginFormInput {
        username: view_data.login.username.trim().to_owned(),
        password: view_data.login.password.clone(),
    };
    if let Err(error) = input.validate() {
        emit_status(state, view_data, internal_tx, error.to_string());
        return;
    }

    match runtime.login(&input.username, &input.password) {
        Ok(Some(user)) => {
            info!(username = %user.username, "signed in");
            view_data.login = LoginUiState::default();
            dispatch(state, view_data, internal_tx, AppCommand::SignIn(user));
            enter_runs_screen(state, runtime, view_data, internal_tx);
        }
        Ok(None) => {
            view_data.login.password.clear();
            view_data.login.field = LoginField::Password;
            dispatch(state, view_data, internal_tx, AppCommand::LoginRejected);
        }
        Err(error) => report_failure(state, view_data, internal_tx, "sign in", &error),
    }
}

fn handle_runs_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.runs_cursor = view_data.runs_cursor.saturating_add(1);
            clamp_runs_cursor(view_data);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.runs_cursor = view_data.runs_cursor.saturating_sub(1);
        }
        KeyCode::Char('/') => {
            let search = view_data.runs_view.search.clone();
            view_data.prompt = Some(PromptState::new(PromptKind::Search, search));
        }
        KeyCode::Char('[') => {
            let current = view_data.runs_view.range.start.map(timefmt::format_filter_date);
            view_data.prompt = Some(PromptState::new(
                PromptKind::StartDate,
                current.unwrap_or_default(),
            ));
        }
        KeyCode::Char(']') => {
            let current = view_data.runs_view.range.end.map(timefmt::format_filter_date);
            view_data.prompt = Some(PromptState::new(
                PromptKind::EndDate,
                current.unwrap_or_default(),
            ));
        }
        KeyCode::Char('x') => {
            apply_view_command(state, view_data, internal_tx, ViewCommand::ResetFilter);
            emit_status(state, view_data, internal_tx, "filter cleared");
        }
        KeyCode::Char(digit @ '1'..='4') => {
            let index = usize::from(digit as u8 - b'1');
            let field = RunSortField::ALL[index];
            apply_view_command(state, view_data, internal_tx, ViewCommand::SortBy(field));
        }
        KeyCode::Enter => {
            if let Some(run) = view_data.selected_run() {
                enter_entries_screen(state, runtime, view_data, internal_tx, run);
            }
        }
        KeyCode::Char('s') => {
            if state.is_busy() {
                emit_status(state, view_data, internal_tx, SCRAPE_BUSY_MESSAGE);
                return;
            }
            let pages = view_data.options.default_pages.max(1).to_string();
            view_data.prompt = Some(PromptState::new(PromptKind::ScrapePages, pages));
        }
        KeyCode::Char('r') => {
            if let Some(run) = view_data.selected_run() {
                let input = RenameFormInput::prefilled(&run);
                view_data.prompt =
                    Some(PromptState::new(PromptKind::Rename(run.id), input.name).about(&run));
            }
        }
        KeyCode::Char('e') => {
            if let Some(run) = view_data.selected_run() {
                let input = NotesFormInput::prefilled(&run);
                view_data.prompt =
                    Some(PromptState::new(PromptKind::Notes(run.id), input.notes).about(&run));
            }
        }
        KeyCode::Char('t') => {
            if let Some(run) = view_data.selected_run() {
                let input = TagsFormInput::prefilled(&run);
                view_data.prompt =
                    Some(PromptState::new(PromptKind::Tags(run.id), input.joined()).about(&run));
            }
        }
        KeyCode::Char('d') => {
            if let Some(run) = view_data.selected_run() {
                view_data.prompt =
                    Some(PromptState::new(PromptKind::ConfirmDelete(run.id), "").about(&run));
            }
        }
        KeyCode::Char('R') => {
            if reload_runs(state, runtime, view_data, internal_tx) {
                emit_status(state, view_data, internal_tx, "runs reloaded");
            }
        }
        KeyCode::Char('c') => download_csv(state, runtime, view_data, internal_tx, None),
        KeyCode::Char('w') => {
            export_current(state, runtime, view_data, internal_tx, ExportKind::Sheet);
        }
        KeyCode::Char('P') => {
            export_current(state, runtime, view_data, internal_tx, ExportKind::Print);
        }
        KeyCode::Char('L') => sign_out(state, view_data, internal_tx),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {
            if let Some(command) = page_command_for_key(key) {
                apply_view_command(state, view_data, internal_tx, command);
            } else if key.code == KeyCode::Char(':') {
                view_data.prompt = Some(PromptState::new(PromptKind::JumpPage, ""));
            }
        }
    }
}

fn handle_entries_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.entries_cursor = view_data.entries_cursor.saturating_add(1);
            clamp_entries_cursor(view_data);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.entries_cursor = view_data.entries_cursor.saturating_sub(1);
        }
        KeyCode::Char('/') => {
            let search = view_data.entries_view.search.clone();
            view_data.prompt = Some(PromptState::new(PromptKind::Search, search));
        }
        KeyCode::Char('x') => {
            apply_view_command(state, view_data, internal_tx, ViewCommand::ResetFilter);
            emit_status(state, view_data, internal_tx, "search cleared");
        }
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
            enter_runs_screen(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char('R') => {
            if reload_entries(state, runtime, view_data, internal_tx) {
                emit_status(state, view_data, internal_tx, "entries reloaded");
            }
        }
        KeyCode::Char('c') => {
            let run_id = view_data.current_run.as_ref().map(|run| run.id);
            if run_id.is_some() {
                download_csv(state, runtime, view_data, internal_tx, run_id);
            }
        }
        KeyCode::Char('w') => {
            export_current(state, runtime, view_data, internal_tx, ExportKind::Sheet);
        }
        KeyCode::Char('P') => {
            export_current(state, runtime, view_data, internal_tx, ExportKind::Print);
        }
        KeyCode::Char('L') => sign_out(state, view_data, internal_tx),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {
            if let Some(command) = page_command_for_key(key) {
                apply_view_command(state, view_data, internal_tx, command);
            } else if key.code == KeyCode::Char(':') {
                view_data.prompt = Some(PromptState::new(PromptKind::JumpPage, ""));
            }
        }
    }
}

fn page_command_for_key(key: KeyEvent) -> Option<ViewCommand> {
    match key.code {
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => Some(ViewCommand::NextPage),
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => Some(ViewCommand::PrevPage),
        KeyCode::Char('g') | KeyCode::Home => Some(ViewCommand::FirstPage),
        KeyCode::Char('G') | KeyCode::End => Some(ViewCommand::LastPage),
        KeyCode::Char('z') => Some(ViewCommand::CyclePageSize),
        _ => None,
    }
}

/// Routes a view command to the listing on screen and resets the cursor
/// whenever the visible slice changes.
fn apply_view_command(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ViewCommand,
) {
    let events = match state.screen {
        Screen::Runs => {
            let total = view_data.run_listing().total_pages;
            view_data.runs_view.dispatch(command, total)
        }
        Screen::Entries(_) => {
            let total = view_data.entry_listing().total_pages;
            view_data.entries_view.dispatch(command, total)
        }
        Screen::Login => return,
    };

    for event in events {
        match event {
            ViewEvent::PageChanged(_)
            | ViewEvent::FilterChanged
            | ViewEvent::PageSizeChanged(_) => {
                view_data.runs_cursor = 0;
                view_data.entries_cursor = 0;
            }
            ViewEvent::SortChanged(sort) => {
                let message = format!("sort {} {}", sort.field.label(), sort.direction.as_str());
                emit_status(state, view_data, internal_tx, message);
            }
            ViewEvent::Rejected(message) => emit_status(state, view_data, internal_tx, message),
        }
    }
}

fn handle_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.prompt.as_mut() else {
        return;
    };

    if let PromptKind::ConfirmDelete(run_id) = prompt.kind {
        view_data.prompt = None;
        if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            delete_run(state, runtime, view_data, internal_tx, run_id);
        } else {
            emit_status(state, view_data, internal_tx, "delete canceled");
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            view_data.prompt = None;
        }
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Enter => {
            if let Some(prompt) = view_data.prompt.take() {
                submit_prompt(state, runtime, view_data, internal_tx, prompt);
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.input.push(ch);
        }
        _ => {}
    }
}

fn submit_prompt<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    prompt: PromptState,
) {
    let input = prompt.input;
    match prompt.kind {
        PromptKind::Search => {
            apply_view_command(state, view_data, internal_tx, ViewCommand::SetSearch(input));
        }
        PromptKind::StartDate | PromptKind::EndDate => {
            let date = if input.trim().is_empty() {
                None
            } else {
                match timefmt::parse_filter_date(&input) {
                    Ok(date) => Some(date),
                    Err(error) => {
                        emit_status(state, view_data, internal_tx, error.to_string());
                        return;
                    }
                }
            };
            let command = if prompt.kind == PromptKind::StartDate {
                ViewCommand::SetStartDate(date)
            } else {
                ViewCommand::SetEndDate(date)
            };
            apply_view_command(state, view_data, internal_tx, command);
        }
        PromptKind::JumpPage => match input.trim().parse::<usize>() {
            Ok(page) => {
                apply_view_command(state, view_data, internal_tx, ViewCommand::JumpTo(page));
            }
            Err(_) => emit_status(
                state,
                view_data,
                internal_tx,
                format!("page {:?} is not a number", input.trim()),
            ),
        },
        PromptKind::ScrapePages => match ScrapeFormInput::parse(&input) {
            Ok(form) => start_scrape(state, runtime, view_data, internal_tx, form.pages),
            Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
        },
        PromptKind::Rename(run_id) => {
            let form = RenameFormInput {
                run_id,
                name: input,
            };
            if let Err(error) = form.validate() {
                emit_status(state, view_data, internal_tx, error.to_string());
                return;
            }
            let outcome = runtime.rename_run(run_id, form.trimmed_name());
            finish_write(state, runtime, view_data, internal_tx, "rename", outcome);
        }
        PromptKind::Notes(run_id) => {
            let outcome = runtime.update_notes(run_id, input.trim());
            finish_write(state, runtime, view_data, internal_tx, "notes update", outcome);
        }
        PromptKind::Tags(run_id) => {
            let form = TagsFormInput::from_raw(run_id, &input);
            let outcome = runtime.update_tags(run_id, &form.tags);
            finish_write(state, runtime, view_data, internal_tx, "tags update", outcome);
        }
        PromptKind::ConfirmDelete(_) => {}
    }
}

/// Refetches after a confirmed write; leaves state alone when it failed.
fn finish_write<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: &str,
    outcome: Result<()>,
) {
    match outcome {
        Ok(()) => {
            info!(action, "write confirmed");
            reload_runs(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, format!("{action} saved"));
        }
        Err(error) => report_failure(state, view_data, internal_tx, action, &error),
    }
}

fn delete_run<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    run_id: RunId,
) {
    let outcome = runtime.delete_run(run_id);
    finish_write(state, runtime, view_data, internal_tx, "delete", outcome);
}

fn start_scrape<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    pages: u32,
) {
    let events = dispatch(state, view_data, internal_tx, AppCommand::BeginScrape { pages });
    if !events.contains(&AppEvent::ScrapeStarted { pages }) {
        return;
    }
    info!(pages, "scrape started");
    if let Err(error) = runtime.spawn_scrape(pages, internal_tx.clone()) {
        warn!(pages, error = %format!("{error:#}"), "scrape worker did not start");
        dispatch(
            state,
            view_data,
            internal_tx,
            AppCommand::FinishScrape(ScrapeResult::Failed),
        );
    }
}

fn sign_out(state: &mut AppState, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    dispatch(state, view_data, internal_tx, AppCommand::SignOut);
    let options = view_data.options;
    let token = view_data.status_token;
    *view_data = ViewData::new(options);
    view_data.status_token = token;
}

fn export_current<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: ExportKind,
) {
    let result = match state.screen {
        Screen::Runs => {
            let listing = view_data.run_listing();
            runtime.export(kind, ExportTarget::Runs(&listing.matched))
        }
        Screen::Entries(_) => {
            let Some(run) = view_data.current_run.as_ref() else {
                return;
            };
            let listing = view_data.entry_listing();
            runtime.export(
                kind,
                ExportTarget::Entries {
                    run,
                    entries: &listing.matched,
                },
            )
        }
        Screen::Login => return,
    };

    match result {
        Ok(path) => emit_status(
            state,
            view_data,
            internal_tx,
            format!("{} {}", kind.verb(), path.display()),
        ),
        Err(error) => report_failure(state, view_data, internal_tx, "export", &error),
    }
}

fn download_csv<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    run_id: Option<RunId>,
) {
    match runtime.download_csv(run_id) {
        Ok(path) => emit_status(
            state,
            view_data,
            internal_tx,
            format!("csv saved to {}", path.display()),
        ),
        Err(error) => report_failure(state, view_data, internal_tx, "csv download", &error),
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    match state.screen {
        Screen::Login => render_login(frame, state, view_data),
        Screen::Runs => render_runs(frame, state, view_data),
        Screen::Entries(_) => render_entries(frame, state, view_data),
    }

    if let Some(prompt) = &view_data.prompt {
        let area = centered_rect(60, 24, frame.area());
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(prompt_overlay_text(prompt))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(prompt.kind.title())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(widget, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_login(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.area());

    let area = centered_rect(50, 40, layout[0]);
    let form = Paragraph::new(login_form_text(&view_data.login)).block(
        Block::default()
            .title("harvest | sign in")
            .borders(Borders::ALL),
    );
    frame.render_widget(form, area);
    render_status(frame, layout[1], state);
}

fn render_runs(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let listing = view_data.run_listing();
    let header = Paragraph::new(stats_text(&listing.stats))
        .block(Block::default().title(header_title(state)).borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let filters = Paragraph::new(filter_text(&view_data.runs_view))
        .block(Block::default().title("filter").borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    let page_size = view_data.runs_view.page_size;
    let visible = listing.visible(page_size);
    if visible.is_empty() {
        let empty = Paragraph::new(runs_placeholder(view_data))
            .block(Block::default().title("runs").borders(Borders::ALL));
        frame.render_widget(empty, layout[2]);
    } else {
        let header = Row::new(
            ["#", "Name", "Pages", "Total Data", "Created", "Tags"]
                .into_iter()
                .map(|label| Cell::from(label).style(header_style())),
        );
        let rows = visible.iter().enumerate().map(|(index, run)| {
            let style = if index == view_data.runs_cursor {
                selected_style()
            } else {
                Style::default()
            };
            Row::new(run_row_cells(run).into_iter().map(Cell::from)).style(style)
        });
        let widths = [
            Constraint::Length(6),
            Constraint::Min(18),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(27),
            Constraint::Min(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::default().title("runs").borders(Borders::ALL));
        frame.render_widget(table, layout[2]);
    }

    let detail = Paragraph::new(
        visible
            .get(view_data.runs_cursor)
            .map(|run| run_detail_text(run))
            .unwrap_or_default(),
    )
    .block(Block::default().title("detail").borders(Borders::ALL));
    frame.render_widget(detail, layout[3]);

    let pager = Paragraph::new(pager_text(
        view_data.runs_view.page,
        listing.total_pages,
        &listing.window,
        visible.len(),
        listing.matched.len(),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(pager, layout[4]);
    render_status(frame, layout[5], state);
}

fn render_entries(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = view_data
        .current_run
        .as_ref()
        .map(|run| format!("entries | {}", run.display_name()))
        .unwrap_or_else(|| "entries".to_owned());
    let search = Paragraph::new(format!("search: {:?}", view_data.entries_view.search))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(search, layout[0]);

    let listing = view_data.entry_listing();
    let page_size = view_data.entries_view.page_size;
    let visible = listing.visible(page_size);
    if visible.is_empty() {
        let empty = Paragraph::new(entries_placeholder(view_data))
            .block(Block::default().title("contacts").borders(Borders::ALL));
        frame.render_widget(empty, layout[1]);
    } else {
        let header = Row::new(
            ["Name", "Phone", "Mobile", "Email"]
                .into_iter()
                .map(|label| Cell::from(label).style(header_style())),
        );
        let rows = visible.iter().enumerate().map(|(index, entry)| {
            let style = if index == view_data.entries_cursor {
                selected_style()
            } else {
                Style::default()
            };
            Row::new(entry_row_cells(entry).into_iter().map(Cell::from)).style(style)
        });
        let widths = [
            Constraint::Min(20),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::default().title("contacts").borders(Borders::ALL));
        frame.render_widget(table, layout[1]);
    }

    let detail = Paragraph::new(
        view_data
            .selected_entry()
            .map(entry_detail_text)
            .unwrap_or_default(),
    )
    .block(Block::default().title("detail").borders(Borders::ALL));
    frame.render_widget(detail, layout[2]);

    let pager = Paragraph::new(pager_text(
        view_data.entries_view.page,
        listing.total_pages,
        &listing.window,
        visible.len(),
        listing.matched.len(),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(pager, layout[3]);
    render_status(frame, layout[4], state);
}

fn render_status(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn header_title(state: &AppState) -> String {
    let mut title = "harvest".to_owned();
    if let Some(user) = state.session.user() {
        title.push_str(&format!(" | {}", user.username));
    }
    if let harvest_app::ScrapeState::Running { pages } = state.scrape {
        title.push_str(&format!(" | scraping {pages} page(s)..."));
    }
    title
}

fn stats_text(stats: &RunStats) -> String {
    format!(
        "runs {} | total data {} | total pages {} | average {} per run",
        stats.runs, stats.total_data, stats.total_pages, stats.average_data
    )
}

fn filter_text(view: &ListView) -> String {
    let start = view
        .range
        .start
        .map(timefmt::format_filter_date)
        .unwrap_or_else(|| "-".to_owned());
    let end = view
        .range
        .end
        .map(timefmt::format_filter_date)
        .unwrap_or_else(|| "-".to_owned());
    format!(
        "search: {:?} | from {start} to {end} | sort {} {} | {} per page",
        view.search,
        view.sort.field.label(),
        view.sort.direction.as_str(),
        view.page_size
    )
}

fn pager_text(
    page: usize,
    total_pages: usize,
    window: &[usize],
    visible: usize,
    matched: usize,
) -> String {
    let numbers = window
        .iter()
        .map(|number| {
            if *number == page {
                format!("[{number}]")
            } else {
                number.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let mut text = page_indicator(page, total_pages);
    if !numbers.is_empty() {
        text = format!("{numbers} | {text}");
    }
    format!("{text} | {}", showing_line(visible, matched))
}

fn run_row_cells(run: &Run) -> Vec<String> {
    vec![
        run.id.to_string(),
        run.display_name(),
        run.pages.to_string(),
        run.total_data_or_zero().to_string(),
        timefmt::format_display(run.created_at),
        run.tags.join(", "),
    ]
}

fn entry_row_cells(entry: &Entry) -> Vec<String> {
    vec![
        entry.name.clone(),
        entry.phone.clone(),
        entry.mobile.clone(),
        entry.email.clone(),
    ]
}

fn runs_placeholder(view_data: &ViewData) -> &'static str {
    if view_data.runs_load_failed {
        RUNS_LOAD_FAILED_MESSAGE
    } else {
        empty_runs_message(view_data.runs_view.is_filtered())
    }
}

fn entries_placeholder(view_data: &ViewData) -> &'static str {
    if view_data.entries_load_failed {
        ENTRIES_LOAD_FAILED_MESSAGE
    } else {
        empty_entries_message(!view_data.entries_view.search.is_empty())
    }
}

fn run_detail_text(run: &Run) -> String {
    let notes = run
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    format!("notes: {}", notes.unwrap_or("-"))
}

fn entry_detail_text(entry: &Entry) -> String {
    let address = entry.address.as_deref().filter(|value| !value.is_empty());
    let source = entry.source.as_deref().filter(|value| !value.is_empty());
    format!(
        "address: {} | source: {}",
        address.unwrap_or("-"),
        source.unwrap_or("-")
    )
}

fn login_form_text(login: &LoginUiState) -> String {
    let marker = |field: LoginField| if login.field == field { ">" } else { " " };
    [
        format!("{} username: {}", marker(LoginField::Username), login.username),
        format!(
            "{} password: {}",
            marker(LoginField::Password),
            "*".repeat(login.password.chars().count())
        ),
        String::new(),
        "tab switch field | enter sign in".to_owned(),
    ]
    .join("\n")
}

fn prompt_overlay_text(prompt: &PromptState) -> String {
    let mut lines = Vec::new();
    if let Some(subject) = &prompt.subject {
        lines.push(format!("run: {subject}"));
    }
    match prompt.kind {
        PromptKind::ConfirmDelete(_) => {
            lines.push("press y to delete, any other key cancels".to_owned());
        }
        PromptKind::Tags(_) => {
            lines.push(format!("> {}_", prompt.input));
            let applied = harvest_app::parse_tags(&prompt.input);
            let suggestions = suggested_tags(&applied);
            if !suggestions.is_empty() {
                lines.push(format!("suggested: {}", suggestions.join(", ")));
            }
        }
        _ => lines.push(format!("> {}_", prompt.input)),
    }
    lines.push("enter apply | esc cancel".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState) -> String {
    let hints = match state.screen {
        Screen::Login => "tab field | enter sign in | ctrl+q quit",
        Screen::Runs => {
            "j/k n/p g/G : | / [ ] x | 1-4 sort z size | enter open | s r e t d | w P c R | L ? ctrl+q"
        }
        Screen::Entries(_) => "j/k n/p g/G : | / x | esc back | w P c R | L ? ctrl+q",
    };
    let screen = state.screen.label().to_uppercase();
    match &state.status_line {
        Some(status) => format!("{screen} | {status} | {hints}"),
        None => format!("{screen} | {hints}"),
    }
}

fn help_overlay_text() -> String {
    [
        "runs",
        "  j/k         move selection",
        "  n/p g/G :   next, previous, first, last, jump to page",
        "  /           search by name",
        "  [ ]         from / to date (YYYY-MM-DD, WITA days)",
        "  x           clear search and dates",
        "  1 2 3 4     sort by name, pages, total data, created",
        "  z           cycle page size",
        "  enter       open the run's contacts",
        "  s           start a scrape",
        "  r e t d     rename, notes, tags, delete",
        "  w P c       export xlsx workbook, print file, backend csv",
        "  R           reload",
        "  L           sign out",
        "",
        "contacts",
        "  /  x        search name, email or phone; clear",
        "  esc         back to runs",
        "",
        "esc or ? closes this help | ctrl+q quits",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
