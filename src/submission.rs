use crate::connectivity::Connectivity;
use crate::error::{JournalError, Result};
use crate::journal_entry::JournalEntry;
use crate::journal_state::EntryStore;
use crate::pipeline::Pipeline;
use crate::timeout::run_with_timeout;
use chrono::{DateTime, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Turns the day's text into a stored entry. Nothing reaches the store
/// unless every check and both backend calls succeed.
pub struct Submitter {
    pipeline: Pipeline,
    connectivity: Arc<dyn Connectivity>,
    deadline: Duration,
}

impl Submitter {
    pub fn new(pipeline: Pipeline, connectivity: Arc<dyn Connectivity>, deadline: Duration) -> Self {
        Submitter {
            pipeline,
            connectivity,
            deadline,
        }
    }

    pub async fn submit<Tz: TimeZone>(
        &self,
        store: &mut EntryStore,
        text: &str,
        now: &DateTime<Tz>,
    ) -> Result<JournalEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::Validation);
        }
        if store.submitted_today(now) {
            return Err(JournalError::AlreadySubmittedToday);
        }
        if !self.connectivity.is_connected().await {
            warn!("submission rejected, offline");
            return Err(JournalError::Connectivity);
        }

        let pipeline = self.pipeline.clone();
        let owned = text.to_string();
        let response = run_with_timeout(
            async move { pipeline.generate_response(&owned).await },
            self.deadline,
        )
        .await?;

        let id = next_id(store, now.timestamp_millis());
        let entry = JournalEntry::new(id, response);
        store.add(entry.clone()).await?;
        info!(id, sentiment = %entry.sentiment, "saved today's entry");
        Ok(entry)
    }
}

/// Current time, bumped past the newest id if the clock went backwards.
fn next_id(store: &EntryStore, now_ms: i64) -> i64 {
    match store.latest_entry() {
        Some(latest) if latest.id >= now_ms => latest.id + 1,
        _ => now_ms,
    }
}
