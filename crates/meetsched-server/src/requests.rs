//! Request payloads and their validation.
//!
//! All field checks happen here, before anything touches the calendar
//! provider. A request that fails validation never costs an upstream call.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use meetsched_core::CalendarEvent;

use crate::config::AppConfig;
use crate::error::ApiError;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_LOCATION_LEN: usize = 500;
const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 480;
const DEFAULT_DURATION_MINUTES: i64 = 60;
const MIN_COLOR_ID: u8 = 1;
const MAX_COLOR_ID: u8 = 11;
const DEFAULT_COLOR_ID: u8 = 9;
const MIN_EVENT_COUNT: usize = 1;
const MAX_EVENT_COUNT: usize = 100;
const DEFAULT_EVENT_COUNT: usize = 10;

/// Body of `POST /calendar/events`.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title; falls back to the configured default.
    pub title: Option<String>,
    /// Who the meeting is scheduled on behalf of.
    pub author: String,
    /// Event date, `YYYY-MM-DD`.
    pub date: String,
    /// Start time, `HH:MM` 24-hour.
    pub time: String,
    /// Length in minutes; defaults to 60.
    pub duration_minutes: Option<i64>,
    /// Free-text description; defaults to "Organized by {author}".
    pub description: Option<String>,
    pub location: Option<String>,
    /// IANA timezone for date and time; falls back to the configured default.
    pub timezone: Option<String>,
    /// Calendar color, 1 through 11; defaults to 9.
    pub color_id: Option<u8>,
}

impl CreateEventRequest {
    /// Validates the request and builds the domain event.
    ///
    /// The date and time are interpreted in the request timezone, then
    /// normalized to UTC on the event.
    pub fn into_event(self, config: &AppConfig) -> Result<CalendarEvent, ApiError> {
        if self.author.trim().is_empty() {
            return Err(ApiError::Validation("author must not be empty".to_string()));
        }

        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(ApiError::Validation("title must not be blank".to_string()));
            }
            Some(title) if title.chars().count() > MAX_TITLE_LEN => {
                return Err(ApiError::Validation(format!(
                    "title must be at most {} characters",
                    MAX_TITLE_LEN
                )));
            }
            Some(title) => title,
            None => config.default_event_title.clone(),
        };

        let timezone: Tz = match self.timezone {
            Some(name) => name.parse().map_err(|_| {
                ApiError::Validation(format!("unknown timezone: {}", name))
            })?,
            None => config.default_timezone,
        };

        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| {
            ApiError::Validation(format!("date must be YYYY-MM-DD, got {:?}", self.date))
        })?;

        let today = Utc::now().with_timezone(&timezone).date_naive();
        if date < today {
            return Err(ApiError::Validation(format!(
                "date {} is in the past",
                date
            )));
        }

        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|_| {
            ApiError::Validation(format!("time must be HH:MM (24-hour), got {:?}", self.time))
        })?;

        let duration_minutes = self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(ApiError::Validation(format!(
                "duration_minutes must be between {} and {}",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        if let Some(description) = &self.description
            && description.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(ApiError::Validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        if let Some(location) = &self.location
            && location.chars().count() > MAX_LOCATION_LEN
        {
            return Err(ApiError::Validation(format!(
                "location must be at most {} characters",
                MAX_LOCATION_LEN
            )));
        }

        let color_id = self.color_id.unwrap_or(DEFAULT_COLOR_ID);
        if !(MIN_COLOR_ID..=MAX_COLOR_ID).contains(&color_id) {
            return Err(ApiError::Validation(format!(
                "color_id must be between {} and {}",
                MIN_COLOR_ID, MAX_COLOR_ID
            )));
        }

        let start_time = resolve_local(date, time, timezone)?;
        let description = self
            .description
            .unwrap_or_else(|| format!("Organized by {}", self.author));

        let mut event = CalendarEvent::new(
            title,
            start_time,
            Duration::minutes(duration_minutes),
            timezone,
        )
        .with_description(description)
        .with_color_id(color_id);
        if let Some(location) = self.location {
            event = event.with_location(location);
        }

        Ok(event)
    }
}

/// Resolves a local date and time to a UTC instant.
///
/// DST transitions make some local times ambiguous and some nonexistent;
/// ambiguous times take the earlier instant, nonexistent ones are rejected.
fn resolve_local(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, ApiError> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(ApiError::Validation(format!(
            "{} {} does not exist in timezone {}",
            date,
            time.format("%H:%M"),
            tz.name()
        ))),
    }
}

/// Query string of `GET /calendar/events`.
#[derive(Debug, Default, Deserialize)]
pub struct GetEventsQuery {
    /// Maximum number of events to return, 1 through 100; defaults to 10.
    pub count: Option<usize>,
}

impl GetEventsQuery {
    /// Validates the query and resolves the effective count.
    pub fn resolve_count(&self) -> Result<usize, ApiError> {
        let count = self.count.unwrap_or(DEFAULT_EVENT_COUNT);
        if !(MIN_EVENT_COUNT..=MAX_EVENT_COUNT).contains(&count) {
            return Err(ApiError::Validation(format!(
                "count must be between {} and {}",
                MIN_EVENT_COUNT, MAX_EVENT_COUNT
            )));
        }
        Ok(count)
    }
}
