pub mod auth;
pub mod books;
pub mod entries;
pub mod error;
pub mod middleware;
pub mod router;

mod time;

use tracing::warn;
use uuid::Uuid;

/// Run a rusqlite closure on the blocking pool, off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("blocking task join error: {}", e))?
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}
