//! Google Calendar API client.
//!
//! One client owns one calendar, an HTTP connection pool, and the
//! authenticator that keeps its bearer token fresh. Failed calls are not
//! retried; errors are logged here and surface to the caller as
//! [`ProviderError`]s.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

use meetsched_core::CalendarEvent;

use crate::auth::Authenticator;
use crate::config::GoogleConfig;
use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::mapper::{EventRecord, domain_to_wire};

/// Client for a single Google calendar.
#[derive(Debug)]
pub struct GoogleCalendar {
    config: GoogleConfig,
    auth: Authenticator,
    http_client: reqwest::Client,
}

impl GoogleCalendar {
    /// Creates a client for the configured calendar.
    ///
    /// Validates the configuration but performs no network I/O; the first
    /// call that needs a token triggers authentication.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate()?;

        let auth = Authenticator::new(&config);

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            auth,
            http_client,
        })
    }

    /// The calendar this client operates on.
    pub fn calendar_id(&self) -> &str {
        &self.config.calendar_id
    }

    /// Lists up to `count` upcoming events, soonest first.
    ///
    /// The lower time bound is the moment of the call, so events already
    /// underway or finished never appear. The bound is also re-applied to
    /// the parsed records, since the API's `timeMin` filters on end time.
    pub async fn get_events(&self, count: usize) -> ProviderResult<Vec<EventRecord>> {
        let credentials = self.auth.ensure_ready().await?;
        let now = Utc::now();

        let url = format!(
            "{}/calendars/{}/events",
            self.config.api_base_url,
            urlencoding::encode(&self.config.calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&credentials.access_token)
            .query(&[
                ("timeMin", now.to_rfc3339()),
                ("maxResults", count.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let body = check_status(response).await.map_err(|e| {
            error!(calendar = %self.config.calendar_id, "event listing failed: {}", e);
            e
        })?;

        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event list: {}", e))
        })?;

        let mut events: Vec<EventRecord> = list
            .items
            .into_iter()
            .filter(|record| match record.start_time() {
                Some(start) => start >= now,
                // All-day entries carry no dateTime; leave them in.
                None => true,
            })
            .collect();
        events.truncate(count);

        debug!(
            calendar = %self.config.calendar_id,
            count = events.len(),
            "fetched upcoming events"
        );
        Ok(events)
    }

    /// Creates an event on the calendar, returning the stored record.
    pub async fn create_event(&self, event: &CalendarEvent) -> ProviderResult<EventRecord> {
        let credentials = self.auth.ensure_ready().await?;
        let payload = domain_to_wire(event);

        let url = format!(
            "{}/calendars/{}/events",
            self.config.api_base_url,
            urlencoding::encode(&self.config.calendar_id)
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(map_send_error)?;

        let body = check_status(response).await.map_err(|e| {
            error!(
                calendar = %self.config.calendar_id,
                title = %event.title,
                "event creation failed: {}", e
            );
            // Keep auth and rate-limit codes intact; only generic upstream
            // failures get rewrapped with creation context.
            match e.code() {
                ProviderErrorCode::ServerError => {
                    ProviderError::server(format!("event creation failed: {}", e.message()))
                }
                _ => e,
            }
        })?;

        let record: EventRecord = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse created event: {}", e))
        })?;

        debug!(
            calendar = %self.config.calendar_id,
            event_id = %record.id,
            "created event"
        );
        Ok(record)
    }
}

/// Maps reqwest transport failures onto the network error code.
fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

/// Maps the response status onto the error taxonomy, returning the body of
/// successful responses.
async fn check_status(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::authentication(
            "access token expired or invalid",
        ));
    }

    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::authorization("access denied to calendar"));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::server(format!(
            "API error ({}): {}",
            status, body
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))
}

/// Response from the events list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<EventRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{TokenInfo, TokenStorage};
    use chrono::Duration;
    use std::path::Path;

    /// Seeds a token file so `ensure_ready` finds a valid cached token and
    /// never reaches for the interactive flow.
    fn seed_token(dir: &Path) -> std::path::PathBuf {
        let token_path = dir.join("tokens.json");
        let storage = TokenStorage::new(&token_path);
        storage
            .set(TokenInfo::new(
                "test-access-token",
                Some("test-refresh".to_string()),
                Some(3600),
                vec!["https://www.googleapis.com/auth/calendar".to_string()],
            ))
            .unwrap();
        token_path
    }

    fn test_config(dir: &Path, token_path: &Path, base_url: &str) -> GoogleConfig {
        GoogleConfig::oauth(dir.join("credentials.json"), token_path, 8080)
            .with_calendar_id("primary")
            .with_api_base_url(base_url)
    }

    fn event_json(id: &str, start: chrono::DateTime<Utc>) -> serde_json::Value {
        let end = start + Duration::minutes(60);
        serde_json::json!({
            "id": id,
            "summary": format!("Event {}", id),
            "status": "confirmed",
            "start": {"dateTime": start.to_rfc3339(), "timeZone": "UTC"},
            "end": {"dateTime": end.to_rfc3339(), "timeZone": "UTC"}
        })
    }

    #[tokio::test]
    async fn get_events_returns_upcoming() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = seed_token(dir.path());

        let now = Utc::now();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::UrlEncoded(
                "maxResults".into(),
                "10".into(),
            ))
            .match_header("authorization", "Bearer test-access-token")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "items": [
                        event_json("a", now + Duration::hours(1)),
                        event_json("b", now + Duration::hours(2)),
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GoogleCalendar::new(test_config(dir.path(), &token_path, &server.url())).unwrap();
        let events = client.get_events(10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "a");
        assert_eq!(events[0].summary, "Event a");
    }

    #[tokio::test]
    async fn get_events_drops_past_events_and_caps_count() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = seed_token(dir.path());

        let now = Utc::now();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "items": [
                        event_json("stale", now - Duration::hours(2)),
                        event_json("a", now + Duration::hours(1)),
                        event_json("b", now + Duration::hours(2)),
                        event_json("c", now + Duration::hours(3)),
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GoogleCalendar::new(test_config(dir.path(), &token_path, &server.url())).unwrap();
        let events = client.get_events(2).await.unwrap();

        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn create_event_posts_wire_payload() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = seed_token(dir.path());

        let start = Utc::now() + Duration::days(1);
        let event = CalendarEvent::new(
            "Planning",
            start,
            Duration::minutes(45),
            chrono_tz::Europe::Paris,
        )
        .with_description("roadmap review")
        .with_color_id(9);

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calendars/primary/events")
            .match_header("authorization", "Bearer test-access-token")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "summary": "Planning",
                "description": "roadmap review",
                "colorId": "9",
                "start": {"timeZone": "Europe/Paris"}
            })))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": "created-1",
                    "summary": "Planning",
                    "status": "confirmed",
                    "htmlLink": "https://calendar.google.com/event?eid=xyz",
                    "start": {"dateTime": start.to_rfc3339(), "timeZone": "Europe/Paris"},
                    "end": {"dateTime": (start + Duration::minutes(45)).to_rfc3339(), "timeZone": "Europe/Paris"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GoogleCalendar::new(test_config(dir.path(), &token_path, &server.url())).unwrap();
        let record = client.create_event(&event).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.id, "created-1");
        assert_eq!(
            record.html_link.as_deref(),
            Some("https://calendar.google.com/event?eid=xyz")
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = seed_token(dir.path());

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": {"code": 401}}"#)
            .create_async()
            .await;

        let client =
            GoogleCalendar::new(test_config(dir.path(), &token_path, &server.url())).unwrap();
        let err = client.get_events(5).await.unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }
}
