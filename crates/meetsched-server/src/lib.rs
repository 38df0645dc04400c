//! Meeting scheduler HTTP service.
//!
//! Exposes a health probe plus list and create operations for a single
//! Google calendar. Request validation happens at this layer; calendar
//! access goes through [`service::CalendarService`].

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod requests;
pub mod service;

use config::AppConfig;
use service::CalendarService;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service: Arc<CalendarService>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/calendar/events",
            get(handlers::get_events).post(handlers::create_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use std::path::{Path, PathBuf};
    use tower::ServiceExt;

    use meetsched_google::{GoogleConfig, TokenInfo, TokenStorage};

    fn seed_token(dir: &Path) -> PathBuf {
        let token_path = dir.join("tokens.json");
        TokenStorage::new(&token_path)
            .set(TokenInfo::new(
                "test-access-token",
                None,
                Some(3600),
                vec![GoogleConfig::DEFAULT_SCOPE.to_string()],
            ))
            .unwrap();
        token_path
    }

    fn test_app_config(dir: &Path) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            calendar_id: "primary".to_string(),
            use_service_account: false,
            oauth_redirect_port: 8080,
            config_dir: dir.to_path_buf(),
            default_event_title: "Demo Meeting".to_string(),
            default_timezone: chrono_tz::UTC,
        }
    }

    /// Builds an app whose provider points at `base_url`. Tests that must
    /// not reach upstream pass an unroutable address.
    async fn test_app(dir: &Path, base_url: &str) -> Router {
        let token_path = seed_token(dir);
        let google = GoogleConfig::oauth(dir.join("credentials.json"), token_path, 8080)
            .with_api_base_url(base_url);
        let state = AppState {
            config: test_app_config(dir),
            service: Arc::new(CalendarService::new(google).unwrap()),
        };
        router(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), "http://127.0.0.1:1").await;

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({"status": "health"}));
    }

    #[tokio::test]
    async fn get_events_rejects_out_of_range_count() {
        let dir = tempfile::tempdir().unwrap();
        // Unroutable base: a request that passes validation would fail loudly.
        let app = test_app(dir.path(), "http://127.0.0.1:1").await;

        let response = app
            .oneshot(
                Request::get("/calendar/events?count=101")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_event_rejects_past_date_before_upstream_call() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), "http://127.0.0.1:1").await;

        let body = serde_json::json!({
            "author": "alice",
            "date": "2020-01-01",
            "time": "10:00"
        });
        let response = app
            .oneshot(
                Request::post("/calendar/events")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("in the past")
        );
    }

    #[tokio::test]
    async fn get_events_returns_event_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let start = Utc::now() + Duration::hours(1);
        let end = start + Duration::hours(1);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "items": [{
                        "id": "evt1",
                        "summary": "Standup",
                        "status": "confirmed",
                        "start": {"dateTime": start.to_rfc3339(), "timeZone": "UTC"},
                        "end": {"dateTime": end.to_rfc3339(), "timeZone": "UTC"}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let app = test_app(dir.path(), &server.url()).await;
        let response = app
            .oneshot(
                Request::get("/calendar/events?count=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["events"][0]["id"], "evt1");
        assert_eq!(json["events"][0]["summary"], "Standup");
    }

    #[tokio::test]
    async fn create_event_returns_201_with_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/calendars/primary/events")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "summary": "Demo Meeting",
                "colorId": "9"
            })))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": "created-1",
                    "summary": "Demo Meeting",
                    "status": "confirmed",
                    "start": {"dateTime": "2030-06-01T10:00:00Z", "timeZone": "UTC"},
                    "end": {"dateTime": "2030-06-01T11:00:00Z", "timeZone": "UTC"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let app = test_app(dir.path(), &server.url()).await;
        let body = serde_json::json!({
            "author": "alice",
            "date": "2030-06-01",
            "time": "10:00"
        });
        let response = app
            .oneshot(
                Request::post("/calendar/events")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["id"], "created-1");
        assert_eq!(json["status"], "confirmed");
    }

    #[tokio::test]
    async fn provider_failure_is_opaque_500() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("upstream exploded with secret details")
            .create_async()
            .await;

        let app = test_app(dir.path(), &server.url()).await;
        let response = app
            .oneshot(
                Request::get("/calendar/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "internal server error");
        assert!(!json.to_string().contains("secret details"));
    }
}
