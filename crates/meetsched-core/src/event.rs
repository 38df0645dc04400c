//! Domain model for a meeting to be scheduled.
//!
//! A [`CalendarEvent`] is built from a validated create-event request and
//! handed to the provider client for one insert call. It is never persisted.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A meeting event in domain form, ready to be sent to the provider.
///
/// Timestamps are UTC-normalized; `timezone` records the IANA zone the
/// caller scheduled the meeting in, which the provider wire format carries
/// alongside each timestamp.
///
/// Invariant: `end_time > start_time`. Construction through [`CalendarEvent::new`]
/// preserves it by deriving the end from a positive duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event title (non-empty).
    pub title: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Optional location string.
    pub location: Option<String>,

    /// Start of the meeting, UTC.
    pub start_time: DateTime<Utc>,

    /// End of the meeting, UTC.
    pub end_time: DateTime<Utc>,

    /// IANA timezone the meeting was scheduled in.
    pub timezone: Tz,

    /// Provider color id (1-11).
    pub color_id: u8,
}

impl CalendarEvent {
    /// Creates an event starting at `start_time` and lasting `duration`.
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        timezone: Tz,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: None,
            start_time,
            end_time: start_time + duration,
            timezone,
            color_id: 1,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the color id.
    pub fn with_color_id(mut self, color_id: u8) -> Self {
        self.color_id = color_id;
        self
    }

    /// Returns the duration of the event.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}
