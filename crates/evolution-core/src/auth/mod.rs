//! Authentication module for managing the session credential.
//!
//! This module provides:
//! - `SessionManager`: single owner of the credential, with change notification
//! - `TokenStore`: the persisted mirror (file, OS keychain or in-memory)
//! - `AccessGate` / `Navigator`: which routes may render for the current session
//!
//! The credential survives restarts through the mirror, which is read once at startup.

pub mod credentials;
pub mod gate;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use gate::{AccessGate, Navigator, Route};
pub use session::{Credential, SessionManager, SessionState, Subscription};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, AUTH_TOKEN_KEY};
