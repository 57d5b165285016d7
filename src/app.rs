//! Application state management for the traffic dashboard
//!
//! This module holds both page controllers and routes keyboard input. Only
//! the visible page is running; switching pages tears the old one down before
//! the new one is initialised.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::cli::{Page, StartupConfig};
use crate::data::TrafficClient;
use crate::pages::{DashboardController, EventsController};

/// Application state enum representing the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Live dashboard
    Dashboard,
    /// Event log and submission form
    Events,
}

impl From<Page> for AppState {
    fn from(page: Page) -> Self {
        match page {
            Page::Dashboard => AppState::Dashboard,
            Page::Events => AppState::Events,
        }
    }
}

/// Main application struct managing state and data
pub struct App {
    /// Current page
    pub state: AppState,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    pub dashboard: DashboardController,
    pub events: EventsController,
}

impl App {
    /// Creates a new App from the startup configuration
    ///
    /// Nothing is fetched until [`App::init`] is called.
    pub fn with_startup_config(config: &StartupConfig) -> Self {
        let client = TrafficClient::new(config.base_url.clone());
        Self {
            state: config.start_page.into(),
            should_quit: false,
            show_help: false,
            dashboard: DashboardController::new(
                client.clone(),
                config.refresh.clone(),
                config.export_dir.clone(),
            ),
            events: EventsController::new(client),
        }
    }

    /// Starts the current page
    pub fn init(&mut self) {
        match self.state {
            AppState::Dashboard => self.dashboard.init(),
            AppState::Events => self.events.init(),
        }
    }

    /// Stops whichever page is running
    pub fn teardown(&mut self) {
        self.dashboard.teardown();
        self.events.teardown();
    }

    /// Moves to another page, tearing down the current one
    pub fn switch_to(&mut self, state: AppState) {
        if state == self.state {
            return;
        }
        self.teardown();
        self.state = state;
        self.init();
    }

    /// Applies results that arrived since the last frame
    pub fn drain_updates(&mut self) -> usize {
        match self.state {
            AppState::Dashboard => self.dashboard.drain(),
            AppState::Events => self.events.drain(),
        }
    }

    /// Handles keyboard input
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            if matches!(key_event.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        // Text fields take every key, including the global shortcuts
        if self.state == AppState::Events && self.events.is_editing_text() {
            self.events.handle_key(key_event);
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('1') => self.switch_to(AppState::Dashboard),
            KeyCode::Char('2') => self.switch_to(AppState::Events),
            _ => {
                match self.state {
                    AppState::Dashboard => self.dashboard.handle_key(key_event),
                    AppState::Events => self.events.handle_key(key_event),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::FormField;
    use crate::refresh::RefreshConfig;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(start_page: Page) -> App {
        App::with_startup_config(&StartupConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            start_page,
            refresh: RefreshConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_initial_state_follows_start_page() {
        assert_eq!(app(Page::Dashboard).state, AppState::Dashboard);
        assert_eq!(app(Page::Events).state, AppState::Events);
    }

    #[test]
    fn test_q_quits() {
        let mut app = app(Page::Dashboard);
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_esc_quits() {
        let mut app = app(Page::Dashboard);
        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = app(Page::Dashboard);
        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        // Other keys are swallowed while help is open
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_typing() {
        let mut app = app(Page::Events);
        app.events.form.focus = FormField::Description;

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert!(app.should_quit);
    }

    #[test]
    fn test_q_is_typed_into_text_field() {
        let mut app = app(Page::Events);
        app.events.form.focus = FormField::Position;

        app.handle_key(key_event(KeyCode::Char('q')));

        assert!(!app.should_quit);
        assert_eq!(app.events.form.position, "q");
    }

    #[tokio::test]
    async fn test_switch_pages_tears_down_previous() {
        let mut app = app(Page::Dashboard);
        app.init();
        assert!(app.dashboard.is_active());

        app.handle_key(key_event(KeyCode::Char('2')));

        assert_eq!(app.state, AppState::Events);
        assert!(!app.dashboard.is_active());
        assert!(app.events.is_active());

        app.handle_key(key_event(KeyCode::Char('1')));

        assert_eq!(app.state, AppState::Dashboard);
        assert!(app.dashboard.is_active());
        assert!(!app.events.is_active());
    }

    #[tokio::test]
    async fn test_switch_to_same_page_is_noop() {
        let mut app = app(Page::Events);
        app.init();
        app.switch_to(AppState::Events);
        assert!(app.events.is_active());
        assert!(!app.dashboard.is_active());
    }

    #[tokio::test]
    async fn test_teardown_stops_all_pages() {
        let mut app = app(Page::Dashboard);
        app.init();
        app.teardown();
        assert!(!app.dashboard.is_active());
        assert_eq!(app.drain_updates(), 0);
    }
}
