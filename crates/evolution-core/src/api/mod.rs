//! REST API client module for the evolution backend.
//!
//! This module provides the `ApiClient` for logging in, registering, and reading
//! and writing tasks, habits, events and journal entries.
//!
//! Protected endpoints authenticate with `Authorization: Token <credential>`, where the
//! credential is read from the shared `SessionManager` at request time.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{is_not_found, ApiError};
