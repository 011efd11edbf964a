//! Application state for the terminal widget
//!
//! Holds the menu cache and view state, handles keyboard input and folds
//! background refresh messages into what the UI shows.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};

use crate::cache::{FetchOutcome, MenuCache, MenuStatus};
use crate::data::get_mensa_by_id;
use crate::refresh::RefreshMessage;

/// What a key press asks the widget to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refresh,
    ScrollUp,
    ScrollDown,
    ToggleHelp,
    Quit,
}

impl Action {
    /// Every action, in the order the help lists them
    pub const ALL: [Action; 5] = [
        Action::Refresh,
        Action::ScrollUp,
        Action::ScrollDown,
        Action::ToggleHelp,
        Action::Quit,
    ];

    /// The action bound to `code`, if any
    pub fn for_key(code: KeyCode) -> Option<Action> {
        match code {
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollDown),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        }
    }

    /// Keys bound to the action, as shown in the help
    pub fn keys(self) -> &'static str {
        match self {
            Action::Refresh => "r",
            Action::ScrollUp => "↑ k",
            Action::ScrollDown => "↓ j",
            Action::ToggleHelp => "?",
            Action::Quit => "q Esc",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Refresh => "Refresh the menu now",
            Action::ScrollUp => "Scroll dishes up",
            Action::ScrollDown => "Scroll dishes down",
            Action::ToggleHelp => "Show or hide this help",
            Action::Quit => "Quit (closes the help first)",
        }
    }
}

/// Main application struct managing state and data
pub struct App {
    /// eat-api canteen key being shown
    pub location: String,
    /// Display name of the canteen
    pub mensa_name: String,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for the dish list
    pub scroll_offset: u16,
    /// When the last refresh was requested or completed
    pub last_refresh: Option<DateTime<Local>>,
    /// Message of the last failed refresh, cleared on success
    pub last_error: Option<String>,
    /// Cache completions already folded into `last_error`/`last_refresh`
    seen_completions: u64,
    /// Menu cache shared with the background refresh
    cache: MenuCache,
}

impl App {
    /// Creates a new App for `location` backed by `cache`
    pub fn new(cache: MenuCache, location: impl Into<String>) -> Self {
        let location = location.into();
        let mensa_name = get_mensa_by_id(&location)
            .map(|m| m.name.to_string())
            .unwrap_or_else(|| location.clone());

        Self {
            location,
            mensa_name,
            should_quit: false,
            show_help: false,
            scroll_offset: 0,
            last_refresh: None,
            last_error: None,
            seen_completions: 0,
            cache,
        }
    }

    /// Current cache state, read without waiting on the network
    pub fn status(&self) -> MenuStatus {
        self.cache.status()
    }

    /// Starts a background fetch; the UI picks the result up on a later frame
    pub fn request_refresh(&mut self) {
        self.cache.get_menu(&self.location);
        self.last_refresh = Some(Local::now());
    }

    /// Folds fetches that finished since the last call into the footer state
    ///
    /// Covers manual refreshes, which send no `RefreshMessage`.
    pub fn sync_outcome(&mut self) {
        let completed = self.cache.completed();
        if completed == self.seen_completions {
            return;
        }
        self.seen_completions = completed;

        match self.cache.last_outcome() {
            Some(FetchOutcome::Failed(err)) => self.last_error = Some(err.to_string()),
            Some(_) => {
                self.last_error = None;
                self.last_refresh = Some(Local::now());
            }
            None => {}
        }
    }

    /// Applies a message from the background refresh
    pub fn handle_refresh_message(&mut self, message: RefreshMessage) {
        match message {
            RefreshMessage::RefreshStarted => {}
            RefreshMessage::MenuUpdated(_) | RefreshMessage::NoMenu => {
                self.last_error = None;
                self.last_refresh = Some(Local::now());
            }
            RefreshMessage::RefreshError(err) => {
                self.last_error = Some(err);
            }
        }
    }

    /// Handles a key press
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        let Some(action) = Action::for_key(key_event.code) else {
            return;
        };

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(action, Action::ToggleHelp | Action::Quit) {
                self.show_help = false;
            }
            return;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Refresh => self.request_refresh(),
            Action::ToggleHelp => self.show_help = true,
            Action::ScrollUp => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            Action::ScrollDown => self.scroll_offset = self.scroll_offset.saturating_add(1),
        }
    }
}
