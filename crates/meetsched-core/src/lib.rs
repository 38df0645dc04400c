//! Core types: domain event model, logging setup

pub mod event;
pub mod logging;

pub use event::CalendarEvent;
pub use logging::{LogConfig, LogFormat, LoggingError, init_logging};
