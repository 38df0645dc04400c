//! Google Calendar integration for meetsched.
//!
//! This crate talks to the Google Calendar API v3 on behalf of the HTTP
//! service. It covers:
//! - Credential acquisition, either through the OAuth 2.0 PKCE flow with
//!   on-disk token caching, or through a service-account key
//! - Bidirectional mapping between the domain [`meetsched_core::CalendarEvent`]
//!   and the provider wire format
//! - Listing upcoming events and inserting new ones

mod auth;
mod client;
mod config;
mod error;
mod mapper;
mod oauth;
mod service_account;
mod tokens;

pub use auth::{AccessCredentials, Authenticator};
pub use client::GoogleCalendar;
pub use config::{AuthMode, GoogleConfig, OAuthCredentials};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use mapper::{EventDateTime, EventPayload, EventPerson, EventRecord, domain_to_wire, wire_to_domain};
pub use oauth::OAuthClient;
pub use service_account::ServiceAccountKey;
pub use tokens::{TokenInfo, TokenStorage};
