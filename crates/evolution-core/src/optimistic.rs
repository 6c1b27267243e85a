//! Two-phase optimistic updates.
//!
//! The local value changes immediately, the remote request runs, and if it fails the
//! previous value is put back so the view never disagrees with the last confirmed
//! server state.

use std::future::Future;

use tracing::debug;

/// Set `slot` to `tentative`, then await `commit`. On error `slot` is restored.
pub async fn apply<T, R, E, F, Fut>(slot: &mut T, tentative: T, commit: F) -> Result<R, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let previous = std::mem::replace(slot, tentative);
    match commit().await {
        Ok(confirmed) => Ok(confirmed),
        Err(e) => {
            debug!("Remote update failed, rolling back local change");
            *slot = previous;
            Err(e)
        }
    }
}
