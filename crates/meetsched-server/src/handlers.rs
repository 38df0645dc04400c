//! HTTP handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Serialize;

use meetsched_google::EventRecord;

use crate::AppState;
use crate::error::ApiError;
use crate::requests::{CreateEventRequest, GetEventsQuery};

/// Response body of `GET /calendar/events`.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "health" }))
}

/// `GET /calendar/events`
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<GetEventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let count = query.resolve_count()?;
    let events = state.service.upcoming_events(count).await?;
    Ok(Json(EventsResponse { events }))
}

/// `POST /calendar/events`
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventRecord>), ApiError> {
    let event = request.into_event(&state.config)?;
    let record = state.service.schedule_event(&event).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
