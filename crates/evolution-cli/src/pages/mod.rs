//! One module per page of the board. Each page checks the session through
//! `App::enter`, fetches what it shows, and reports its own errors.

pub mod dashboard;
pub mod events;
pub mod habits;
pub mod journal;
pub mod settings;
pub mod tasks;
