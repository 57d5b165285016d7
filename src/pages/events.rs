//! Event log page
//!
//! Shows every recorded event, ten rows per page, and a form for reporting a
//! new one. Row details (position and description) are filled in lazily the
//! first time their page is shown.

use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{cycle_next, cycle_prev, Feedback, UPDATE_CHANNEL_CAPACITY};
use crate::data::client::CREATE_EVENT_FALLBACK_ERROR;
use crate::data::format::or_placeholder;
use crate::data::{
    ApiError, EventStatus, EventType, NewEvent, Road, TrafficClient, TrafficEvent,
};
use crate::utils::pagination::DEFAULT_ITEMS_PER_PAGE;
use crate::utils::{LazyElement, LazyLoader, LazySource, PageTarget, Pagination, PaginationControls};

/// Number of events requested for the log
pub const EVENT_LIST_LIMIT: u32 = 50;

pub const EVENT_CREATED_MESSAGE: &str = "Event created!";
pub const ROADS_LOAD_ERROR: &str = "Unable to load road list";
pub const EVENTS_LOAD_ERROR: &str = "Unable to load event list";

const SEVERITY_CHOICES: [Option<u8>; 6] = [None, Some(1), Some(2), Some(3), Some(4), Some(5)];

/// Results delivered to the events page by its fetch tasks
#[derive(Debug)]
pub enum EventsUpdate {
    Roads(Result<Vec<Road>, ApiError>),
    Events(Result<Vec<TrafficEvent>, ApiError>),
    Created(Result<TrafficEvent, ApiError>),
}

/// Input fields of the event form, in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Road,
    Type,
    Status,
    Severity,
    Position,
    Description,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Road,
        FormField::Type,
        FormField::Status,
        FormField::Severity,
        FormField::Position,
        FormField::Description,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Road => "Road",
            FormField::Type => "Type",
            FormField::Status => "Status",
            FormField::Severity => "Severity",
            FormField::Position => "Position",
            FormField::Description => "Description",
        }
    }

    /// Whether the field takes free text rather than a choice
    pub fn is_text(&self) -> bool {
        matches!(self, FormField::Position | FormField::Description)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Steps through `choices` from `current`, wrapping at both ends
fn step_choice<T: Copy + PartialEq>(choices: &[T], current: T, forward: bool) -> T {
    let index = choices.iter().position(|c| *c == current);
    let next = if forward {
        cycle_next(index, choices.len())
    } else {
        cycle_prev(index, choices.len())
    };
    next.map_or(current, |i| choices[i])
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Current contents of the event form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventForm {
    /// Index into the road list; `None` until a road is picked
    pub road: Option<usize>,
    pub kind: EventType,
    pub status: EventStatus,
    pub severity: Option<u8>,
    pub position: String,
    pub description: String,
    pub focus: FormField,
}

impl Default for EventForm {
    fn default() -> Self {
        Self {
            road: None,
            kind: EventType::Accident,
            status: EventStatus::Active,
            severity: None,
            position: String::new(),
            description: String::new(),
            focus: FormField::Road,
        }
    }
}

impl EventForm {
    /// Builds the request body; empty text becomes `null` and no road omits `road_id`
    pub fn to_new_event(&self, roads: &[Road]) -> NewEvent {
        NewEvent {
            road_id: self.road.and_then(|i| roads.get(i)).map(|road| road.id),
            kind: self.kind,
            status: self.status,
            severity: self.severity,
            position: non_empty(&self.position),
            description: non_empty(&self.description),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Moves the focused choice field forward or backward
    fn cycle_focused(&mut self, forward: bool, road_count: usize) {
        match self.focus {
            FormField::Road => {
                // The unselected state sits between the last and first road
                self.road = match (self.road, forward) {
                    (None, true) if road_count > 0 => Some(0),
                    (None, false) if road_count > 0 => Some(road_count - 1),
                    (Some(i), true) if i + 1 < road_count => Some(i + 1),
                    (Some(i), false) if i > 0 && i <= road_count => Some(i - 1),
                    _ => None,
                };
            }
            FormField::Type => self.kind = step_choice(&EventType::ALL, self.kind, forward),
            FormField::Status => {
                self.status = step_choice(&EventStatus::ALL, self.status, forward)
            }
            FormField::Severity => {
                self.severity = step_choice(&SEVERITY_CHOICES, self.severity, forward)
            }
            FormField::Position | FormField::Description => {}
        }
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Position => Some(&mut self.position),
            FormField::Description => Some(&mut self.description),
            _ => None,
        }
    }
}

/// One line of the event table, with its lazily revealed details
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub event: TrafficEvent,
    pub details: LazySource,
}

impl EventRow {
    pub fn new(event: TrafficEvent) -> Self {
        let details = LazySource::deferred(format!(
            "Position: {} | {}",
            or_placeholder(event.position.as_deref()),
            event.description.as_deref().unwrap_or("No description")
        ));
        Self { event, details }
    }
}

impl LazyElement for EventRow {
    fn deferred_source(&self) -> Option<&str> {
        self.details.deferred_source()
    }

    fn promote(&mut self) {
        self.details.promote();
    }
}

struct Session {
    tx: mpsc::Sender<EventsUpdate>,
    rx: mpsc::Receiver<EventsUpdate>,
}

/// Controller for the event log page
pub struct EventsController {
    client: TrafficClient,
    session: Option<Session>,
    pub roads: Vec<Road>,
    pub rows: Vec<EventRow>,
    /// Whether the event list has been received at least once
    pub events_loaded: bool,
    pub form: EventForm,
    /// Result of the last submission
    pub feedback: Option<Feedback>,
    pub roads_error: Option<String>,
    pub events_error: Option<String>,
    pub submitting: bool,
    current_page: i64,
    loader: LazyLoader,
}

impl EventsController {
    pub fn new(client: TrafficClient) -> Self {
        Self {
            client,
            session: None,
            roads: Vec::new(),
            rows: Vec::new(),
            events_loaded: false,
            form: EventForm::default(),
            feedback: None,
            roads_error: None,
            events_error: None,
            submitting: false,
            current_page: 1,
            loader: LazyLoader::default(),
        }
    }

    /// Opens the update channel and loads roads and events
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&mut self) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        self.session = Some(Session { tx, rx });
        self.load_roads();
        self.load_events();
    }

    /// Drops the update channel; in-flight results are discarded
    pub fn teardown(&mut self) {
        self.session = None;
        self.submitting = false;
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    fn sender(&self) -> Option<mpsc::Sender<EventsUpdate>> {
        self.session.as_ref().map(|session| session.tx.clone())
    }

    fn load_roads(&self) {
        let Some(tx) = self.sender() else { return };
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.fetch_roads().await;
            let _ = tx.send(EventsUpdate::Roads(result)).await;
        });
    }

    fn load_events(&self) {
        let Some(tx) = self.sender() else { return };
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.fetch_events(Some("all"), Some(EVENT_LIST_LIMIT)).await;
            let _ = tx.send(EventsUpdate::Events(result)).await;
        });
    }

    /// Posts the form
    ///
    /// # Returns
    /// `false` if a submission is already in flight or the page is not active
    pub fn submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        let Some(tx) = self.sender() else {
            return false;
        };

        let payload = self.form.to_new_event(&self.roads);
        let client = self.client.clone();
        self.submitting = true;
        self.feedback = None;

        tokio::spawn(async move {
            let result = client.create_event(&payload).await;
            let _ = tx.send(EventsUpdate::Created(result)).await;
        });
        true
    }

    /// Applies every pending update
    ///
    /// # Returns
    /// The number of updates applied
    pub fn drain(&mut self) -> usize {
        let mut updates = Vec::new();
        if let Some(session) = self.session.as_mut() {
            while let Ok(update) = session.rx.try_recv() {
                updates.push(update);
            }
        }

        let count = updates.len();
        for update in updates {
            self.apply(update);
        }
        count
    }

    pub fn apply(&mut self, update: EventsUpdate) {
        match update {
            EventsUpdate::Roads(Ok(roads)) => {
                if self.form.road.is_some_and(|i| i >= roads.len()) {
                    self.form.road = None;
                }
                self.roads = roads;
                self.roads_error = None;
            }
            EventsUpdate::Roads(Err(err)) => {
                warn!(error = %err, "Failed to load roads");
                self.roads_error = Some(ROADS_LOAD_ERROR.to_string());
            }
            EventsUpdate::Events(Ok(events)) => {
                self.rows = events.into_iter().map(EventRow::new).collect();
                self.events_loaded = true;
                self.events_error = None;
                self.loader = LazyLoader::observe_deferred(&self.rows);
                self.set_page(1);
            }
            EventsUpdate::Events(Err(err)) => {
                warn!(error = %err, "Failed to load events");
                self.events_error = Some(EVENTS_LOAD_ERROR.to_string());
            }
            EventsUpdate::Created(Ok(event)) => {
                info!(id = ?event.id, kind = %event.kind, "Event created");
                self.submitting = false;
                self.feedback = Some(Feedback::success(EVENT_CREATED_MESSAGE));
                self.form.reset();
                self.load_events();
            }
            EventsUpdate::Created(Err(err)) => {
                self.submitting = false;
                let message = match err {
                    ApiError::Rejected { message, .. } => message,
                    other => {
                        warn!(error = %other, "Failed to create event");
                        CREATE_EVENT_FALLBACK_ERROR.to_string()
                    }
                };
                self.feedback = Some(Feedback::danger(message));
            }
        }
    }

    pub fn current_page(&self) -> i64 {
        self.current_page
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::compute(self.rows.len(), DEFAULT_ITEMS_PER_PAGE, self.current_page)
    }

    pub fn controls(&self) -> PaginationControls {
        PaginationControls::new(&self.pagination())
    }

    /// Rows on the current page
    pub fn visible_rows(&self) -> &[EventRow] {
        &self.rows[self.pagination().item_range()]
    }

    /// Follows a pagination link
    ///
    /// # Returns
    /// `true` if the page changed
    pub fn go_to(&mut self, target: PageTarget) -> bool {
        let mut new_page = None;
        let moved = self.controls().activate(target, |page| new_page = Some(page));
        if let Some(page) = new_page {
            self.set_page(page);
        }
        moved
    }

    fn set_page(&mut self, page: i64) {
        self.current_page = page;
        let visible = self.pagination().item_range();
        self.loader.on_viewport(&mut self.rows, visible);
    }

    /// Whether keystrokes are going into a text field
    pub fn is_editing_text(&self) -> bool {
        self.form.focus.is_text()
    }

    /// Handles a key press on this page
    ///
    /// # Returns
    /// `true` if the key was used
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.form.focus = self.form.focus.next();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.focus = self.form.focus.prev();
            }
            KeyCode::Right => self.form.cycle_focused(true, self.roads.len()),
            KeyCode::Left => self.form.cycle_focused(false, self.roads.len()),
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::PageDown => {
                self.go_to(PageTarget::Next);
            }
            KeyCode::PageUp => {
                self.go_to(PageTarget::Previous);
            }
            KeyCode::Esc if self.is_editing_text() => {
                self.form.focus = FormField::Road;
            }
            KeyCode::Backspace => match self.form.focused_text_mut() {
                Some(text) => {
                    text.pop();
                }
                None => return false,
            },
            KeyCode::Char(c) => match self.form.focused_text_mut() {
                Some(text) => text.push(c),
                None => match c {
                    ']' => {
                        self.go_to(PageTarget::Next);
                    }
                    '[' => {
                        self.go_to(PageTarget::Previous);
                    }
                    _ => return false,
                },
            },
            _ => return false,
        }
        true
    }
}
