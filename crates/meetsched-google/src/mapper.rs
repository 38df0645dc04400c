//! Translation between the domain event model and the Calendar API wire
//! format.
//!
//! Pure and stateless: the only failure modes are malformed timestamps or
//! timezone names coming back from the wire.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use meetsched_core::CalendarEvent;

use crate::error::{ProviderError, ProviderResult};

/// A start/end object on the wire: `{dateTime, timeZone}` for timed events,
/// `{date}` for all-day events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp with offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day date, YYYY-MM-DD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// IANA timezone name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// The body submitted to the events insert endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub summary: String,
    /// Empty string when the domain event has no description.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub color_id: String,
}

/// A person attached to an event (creator, organizer, attendee).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPerson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
}

/// An event record as returned by the API.
///
/// Missing optional fields stay absent; the only substituted defaults are
/// the documented ones ("No Title" summary, "confirmed" status).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default = "default_summary")]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    /// Canonical calendar-UI link assigned by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<EventPerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<EventPerson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventPerson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

fn default_summary() -> String {
    "No Title".to_string()
}

fn default_status() -> String {
    "confirmed".to_string()
}

impl EventRecord {
    /// Parses the start timestamp, if this is a timed event.
    pub fn start_time(&self) -> Option<DateTime<chrono::Utc>> {
        self.start
            .date_time
            .as_deref()
            .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

/// Maps a domain event to the wire payload.
///
/// Timestamps are emitted UTC-normalized in RFC 3339; the configured IANA
/// timezone travels in the `timeZone` field next to each of them.
pub fn domain_to_wire(event: &CalendarEvent) -> EventPayload {
    let time_zone = event.timezone.name().to_string();

    EventPayload {
        summary: event.title.clone(),
        description: event.description.clone().unwrap_or_default(),
        location: event.location.clone(),
        start: EventDateTime {
            date_time: Some(event.start_time.to_rfc3339()),
            date: None,
            time_zone: Some(time_zone.clone()),
        },
        end: EventDateTime {
            date_time: Some(event.end_time.to_rfc3339()),
            date: None,
            time_zone: Some(time_zone),
        },
        color_id: event.color_id.to_string(),
    }
}

/// Maps a wire payload back to a domain event.
pub fn wire_to_domain(payload: &EventPayload) -> ProviderResult<CalendarEvent> {
    let start_time = parse_date_time(&payload.start, "start")?;
    let end_time = parse_date_time(&payload.end, "end")?;

    let timezone: Tz = match payload.start.time_zone.as_deref() {
        Some(name) => name.parse().map_err(|_| {
            ProviderError::invalid_response(format!("unknown timezone: {}", name))
        })?,
        None => chrono_tz::UTC,
    };

    let color_id = payload
        .color_id
        .parse::<u8>()
        .map_err(|_| ProviderError::invalid_response(format!("bad color id: {}", payload.color_id)))?;

    Ok(CalendarEvent {
        title: payload.summary.clone(),
        description: (!payload.description.is_empty()).then(|| payload.description.clone()),
        location: payload.location.clone(),
        start_time,
        end_time,
        timezone,
        color_id,
    })
}

fn parse_date_time(
    wire: &EventDateTime,
    which: &str,
) -> ProviderResult<DateTime<chrono::Utc>> {
    let raw = wire.date_time.as_deref().ok_or_else(|| {
        ProviderError::invalid_response(format!("missing {} dateTime", which))
    })?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| ProviderError::invalid_response(format!("bad {} dateTime: {}", which, e)))
}
