//! Page controllers
//!
//! Each page owns its state, its update channel and its background work.
//! `init` starts loading and `teardown` stops everything the page spawned;
//! results that arrive after teardown are dropped with the channel.
//!
//! Fetches run as tokio tasks and report back over a bounded mpsc channel
//! that the UI loop drains between frames, so page state is only ever touched
//! from one thread.

pub mod dashboard;
pub mod events;

pub use dashboard::{DashboardController, DashboardUpdate, HistoryWindow};
pub use events::{EventsController, EventsUpdate, FormField};

use std::sync::atomic::{AtomicU64, Ordering};

/// Capacity of each page's update channel
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Identifies one request among a series that supersede each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Counter that issues tickets; only the latest ticket is current
///
/// Shared between the controller and its fetch tasks so a response can be
/// matched against the most recent request for the same region.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket, making every earlier one stale
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Tone of an inline message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
}

/// Inline message shown next to a form or table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub tone: Tone,
    pub message: String,
}

impl Feedback {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Danger,
            message: message.into(),
        }
    }
}

/// Next index when cycling forward through `len` items
pub(crate) fn cycle_next(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(current.map_or(0, |i| (i + 1) % len))
}

/// Previous index when cycling backward through `len` items
pub(crate) fn cycle_prev(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(i) => i - 1,
    })
}
