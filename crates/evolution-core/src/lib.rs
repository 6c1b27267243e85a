//! Core library for the evolution productivity client.
//!
//! - `auth`: the session core (credential state, persisted mirror, access gate)
//! - `api`: REST client for the evolution backend
//! - `models`: tasks, habits, events, journal entries and the list logic built on them
//! - `optimistic`: tentative local updates that roll back when the server rejects them
//! - `config`: user configuration on disk

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod optimistic;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AccessGate, Credential, Navigator, Route, SessionManager, SessionState};
pub use config::Config;
