//! Deadline enforcement for upstream fetches.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Run `fetch` with a deadline; expiry becomes `TransportError::Timeout`,
/// converted into the caller's error type.
pub async fn with_deadline<T, E, F>(deadline: Duration, fetch: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
{
    match tokio::time::timeout(deadline, fetch).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline).into()),
    }
}
