use crate::error::{JournalError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub const DEFAULT_PIPELINE_TIMEOUT_MS: u64 = 60_000;

/// Races `operation` against `deadline`.
///
/// The operation runs on its own task, so when the deadline wins it is left
/// running to completion and its result is dropped. Nothing is cancelled.
/// A deadline that elapses at the same instant the operation finishes counts
/// as a timeout.
pub async fn run_with_timeout<F, T>(operation: F, deadline: Duration) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    tokio::select! {
        biased;
        _ = sleep(deadline) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "operation timed out");
            Err(JournalError::Timeout(deadline))
        }
        joined = handle => match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(JournalError::inference(format!("task failed: {err}"))),
        },
    }
}
