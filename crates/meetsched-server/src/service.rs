//! Calendar operations behind the HTTP handlers.

use tracing::info;

use meetsched_core::CalendarEvent;
use meetsched_google::{EventRecord, GoogleCalendar, GoogleConfig};

use crate::error::ApiError;

/// Owns the provider client for the configured calendar.
///
/// One instance lives for the life of the process; the client underneath
/// reuses its HTTP pool and cached credentials across requests.
#[derive(Debug)]
pub struct CalendarService {
    client: GoogleCalendar,
}

impl CalendarService {
    /// Creates the service from a provider configuration.
    pub fn new(config: GoogleConfig) -> Result<Self, ApiError> {
        let client = GoogleCalendar::new(config)
            .map_err(|e| ApiError::Internal(format!("failed to create calendar client: {}", e)))?;
        Ok(Self { client })
    }

    /// Lists up to `count` upcoming events, soonest first.
    pub async fn upcoming_events(&self, count: usize) -> Result<Vec<EventRecord>, ApiError> {
        let events = self.client.get_events(count).await?;
        Ok(events)
    }

    /// Schedules an event and returns the stored record.
    pub async fn schedule_event(&self, event: &CalendarEvent) -> Result<EventRecord, ApiError> {
        let record = self.client.create_event(event).await?;
        info!(
            event_id = %record.id,
            calendar = %self.client.calendar_id(),
            title = %event.title,
            "scheduled event"
        );
        Ok(record)
    }
}
