use tracing::error;

/// Run blocking device or disk work on the blocking pool.
///
/// Returns `None` only if the task panicked or was cancelled.
pub async fn run_blocking<T, F>(work: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "blocking task failed");
            None
        }
    }
}
