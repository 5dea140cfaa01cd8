// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{RunId, Screen, ScrapeOutcome, User};

pub const SCRAPE_FAILED_MESSAGE: &str = "scrape failed -- try fewer pages";
pub const LOGIN_FAILED_MESSAGE: &str = "invalid username or password";
pub const SCRAPE_BUSY_MESSAGE: &str = "a scrape is already running";
pub const SIGN_IN_REQUIRED_MESSAGE: &str = "sign in first";

pub const NO_RUNS_MESSAGE: &str = "no runs yet";
pub const NO_MATCHING_RUNS_MESSAGE: &str = "no runs match the current filter";
pub const NO_ENTRIES_MESSAGE: &str = "no entries";
pub const NO_MATCHING_ENTRIES_MESSAGE: &str = "no entries match the search";
pub const RUNS_LOAD_FAILED_MESSAGE: &str = "runs could not be loaded -- press R to retry";
pub const ENTRIES_LOAD_FAILED_MESSAGE: &str = "entries could not be loaded -- press R to retry";

/// Placeholder text for an empty run table.
pub fn empty_runs_message(filtered: bool) -> &'static str {
    if filtered {
        NO_MATCHING_RUNS_MESSAGE
    } else {
        NO_RUNS_MESSAGE
    }
}

pub fn empty_entries_message(searching: bool) -> &'static str {
    if searching {
        NO_MATCHING_ENTRIES_MESSAGE
    } else {
        NO_ENTRIES_MESSAGE
    }
}

/// The signed-in user, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) -> Option<User> {
        self.user.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Idle,
    Running { pages: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub session: Session,
    pub scrape: ScrapeState,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            session: Session::default(),
            scrape: ScrapeState::Idle,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    Succeeded(ScrapeOutcome),
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SignIn(User),
    LoginRejected,
    SignOut,
    OpenRuns,
    OpenEntries(RunId),
    BeginScrape { pages: u32 },
    FinishScrape(ScrapeResult),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    SessionChanged(Option<String>),
    ScrapeStarted { pages: u32 },
    ScrapeFinished,
    ScrapeIgnored,
    RunsInvalidated,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn is_busy(&self) -> bool {
        matches!(self.scrape, ScrapeState::Running { .. })
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SignIn(user) => {
                let message = format!("signed in as {}", user.username);
                let username = user.username.clone();
                self.session.sign_in(user);
                self.screen = Screen::Runs;
                vec![
                    AppEvent::SessionChanged(Some(username)),
                    AppEvent::ScreenChanged(self.screen),
                    self.set_status(&message),
                ]
            }
            AppCommand::LoginRejected => {
                self.screen = Screen::Login;
                vec![self.set_status(LOGIN_FAILED_MESSAGE)]
            }
            AppCommand::SignOut => {
                self.session.sign_out();
                self.screen = Screen::Login;
                vec![
                    AppEvent::SessionChanged(None),
                    AppEvent::ScreenChanged(self.screen),
                    self.set_status("signed out"),
                ]
            }
            AppCommand::OpenRuns => self.open(Screen::Runs),
            AppCommand::OpenEntries(run_id) => self.open(Screen::Entries(run_id)),
            AppCommand::BeginScrape { pages } => {
                if self.is_busy() {
                    return vec![AppEvent::ScrapeIgnored, self.set_status(SCRAPE_BUSY_MESSAGE)];
                }
                self.scrape = ScrapeState::Running { pages };
                vec![
                    AppEvent::ScrapeStarted { pages },
                    self.set_status(&format!("scraping {pages} page(s)...")),
                ]
            }
            AppCommand::FinishScrape(result) => {
                self.scrape = ScrapeState::Idle;
                match result {
                    ScrapeResult::Succeeded(outcome) => vec![
                        AppEvent::ScrapeFinished,
                        AppEvent::RunsInvalidated,
                        self.set_status(&format!(
                            "scrape finished: run {} collected {} entries",
                            outcome.run_id, outcome.total
                        )),
                    ],
                    ScrapeResult::Failed => vec![
                        AppEvent::ScrapeFinished,
                        self.set_status(SCRAPE_FAILED_MESSAGE),
                    ],
                }
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn open(&mut self, screen: Screen) -> Vec<AppEvent> {
        if screen.requires_session() && !self.session.is_signed_in() {
            self.screen = Screen::Login;
            return vec![
                AppEvent::ScreenChanged(self.screen),
                self.set_status(SIGN_IN_REQUIRED_MESSAGE),
            ];
        }
        self.screen = screen;
        vec![AppEvent::ScreenChanged(screen)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
