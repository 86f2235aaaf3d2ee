use crate::error::{JournalError, Result};
use crate::journal_entry::{same_calendar_day, JournalEntry};
use crate::storage::KeyValueStore;
use chrono::{DateTime, NaiveDate, TimeZone};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const ENTRIES_KEY: &str = "entries";
pub const LATEST_ENTRY_KEY: &str = "latestEntry";

/// In-memory cache of the persisted journal.
///
/// `entries` is always newest first and `latest` always mirrors its head.
/// Every mutation writes the `entries` snapshot before touching the cache,
/// so a failed write leaves the cache as it was. The `latestEntry` key is
/// written after the snapshot for readers that only want the newest entry;
/// it is never trusted on load.
pub struct EntryStore {
    entries: Vec<JournalEntry>,
    latest: Option<JournalEntry>,
    storage: Arc<dyn KeyValueStore>,
}

impl EntryStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        EntryStore {
            entries: Vec::new(),
            latest: None,
            storage,
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let Some(serialized) = self.storage.get(ENTRIES_KEY).await? else {
            info!("no saved entries, starting with an empty journal");
            return Ok(());
        };

        let mut entries: Vec<JournalEntry> = serde_json::from_str(&serialized)
            .map_err(|e| JournalError::persistence(format!("corrupt entries snapshot: {e}")))?;
        sort_newest_first(&mut entries);
        let before = entries.len();
        entries.dedup_by_key(|e| e.id);
        if entries.len() != before {
            warn!(dropped = before - entries.len(), "dropped entries with repeated ids");
        }

        let latest = entries.first().cloned();
        self.check_saved_latest(latest.as_ref()).await;

        info!(count = entries.len(), "loaded journal entries");
        self.entries = entries;
        self.latest = latest;
        Ok(())
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn latest_entry(&self) -> Option<&JournalEntry> {
        self.latest.as_ref()
    }

    /// Entries created on or after `day` in `tz`, newest first.
    pub fn entries_since<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<&JournalEntry> {
        self.entries
            .iter()
            .filter(|e| e.day_in(tz).is_some_and(|d| d >= day))
            .collect()
    }

    pub fn submitted_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.latest
            .as_ref()
            .is_some_and(|latest| same_calendar_day(latest, now))
    }

    pub async fn add(&mut self, entry: JournalEntry) -> Result<()> {
        if self.entries.iter().any(|e| e.id == entry.id) {
            return Err(JournalError::DuplicateEntry(entry.id));
        }
        let id = entry.id;
        let mut next = Vec::with_capacity(self.entries.len() + 1);
        next.push(entry);
        next.extend(self.entries.iter().cloned());
        sort_newest_first(&mut next);

        self.commit(next).await?;
        info!(id, "added entry");
        Ok(())
    }

    /// Returns false, without writing anything, if no entry has this id.
    pub async fn remove(&mut self, id: i64) -> Result<bool> {
        if !self.entries.iter().any(|e| e.id == id) {
            return Ok(false);
        }
        let next = self
            .entries
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();

        self.commit(next).await?;
        info!(id, "removed entry");
        Ok(true)
    }

    pub async fn clear(&mut self) -> Result<()> {
        if let Err(err) = self.storage.remove(ENTRIES_KEY).await {
            error!(%err, "failed to clear saved entries");
            return Err(err);
        }
        self.entries.clear();
        self.latest = None;
        self.save_latest().await;
        info!("cleared all entries");
        Ok(())
    }

    async fn commit(&mut self, next: Vec<JournalEntry>) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        if let Err(err) = self.storage.set(ENTRIES_KEY, serialized).await {
            error!(%err, "failed to save entries");
            return Err(err);
        }
        self.latest = next.first().cloned();
        self.entries = next;
        self.save_latest().await;
        Ok(())
    }

    async fn save_latest(&self) {
        let result = match &self.latest {
            Some(latest) => match serde_json::to_string(latest) {
                Ok(serialized) => self.storage.set(LATEST_ENTRY_KEY, serialized).await,
                Err(err) => Err(err.into()),
            },
            None => self.storage.remove(LATEST_ENTRY_KEY).await,
        };
        if let Err(err) = result {
            warn!(%err, "failed to save latest entry pointer");
        }
    }

    async fn check_saved_latest(&self, expected: Option<&JournalEntry>) {
        let saved = match self.storage.get(LATEST_ENTRY_KEY).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!(%err, "could not read latest entry pointer");
                return;
            }
        };
        let saved_id = saved
            .as_deref()
            .and_then(|s| serde_json::from_str::<Option<JournalEntry>>(s).ok())
            .flatten()
            .map(|e| e.id);
        if saved_id != expected.map(|e| e.id) {
            warn!(?saved_id, "saved latest entry disagrees with entries, using entries");
        }
    }
}

fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.id.cmp(&a.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Sentiment;
    use crate::storage::tests::MemoryStore;
    use chrono::{FixedOffset, Utc};

    fn entry(id: i64, message: &str) -> JournalEntry {
        JournalEntry {
            id,
            message: message.to_string(),
            sentiment: Sentiment::Positive,
            color: Sentiment::Positive.color().to_string(),
            summary: "s".to_string(),
            suggestion: "t".to_string(),
        }
    }

    fn ids(store: &EntryStore) -> Vec<i64> {
        store.entries().iter().map(|e| e.id).collect()
    }

    fn saved_ids(storage: &MemoryStore) -> Vec<i64> {
        let saved: Vec<JournalEntry> =
            serde_json::from_str(&storage.value(ENTRIES_KEY).unwrap()).unwrap();
        saved.iter().map(|e| e.id).collect()
    }

    fn saved_latest_id(storage: &MemoryStore) -> Option<i64> {
        storage
            .value(LATEST_ENTRY_KEY)
            .map(|s| serde_json::from_str::<JournalEntry>(&s).unwrap().id)
    }

    #[tokio::test]
    async fn load_without_snapshot_is_empty() {
        let mut store = EntryStore::new(Arc::new(MemoryStore::default()));
        store.load().await.unwrap();
        assert!(store.entries().is_empty());
        assert!(store.latest_entry().is_none());
    }

    #[tokio::test]
    async fn entries_stay_newest_first_whatever_the_insert_order() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        for id in [20, 50, 10, 40] {
            store.add(entry(id, "m")).await.unwrap();
        }

        assert_eq!(ids(&store), vec![50, 40, 20, 10]);
        assert_eq!(store.latest_entry().unwrap().id, 50);
        assert_eq!(saved_ids(&storage), vec![50, 40, 20, 10]);
        assert_eq!(saved_latest_id(&storage), Some(50));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let mut store = EntryStore::new(Arc::new(MemoryStore::default()));
        store.add(entry(1, "a")).await.unwrap();
        assert!(matches!(
            store.add(entry(1, "b")).await,
            Err(JournalError::DuplicateEntry(1))
        ));
        assert_eq!(store.entries().len(), 1);
    }

    #[tokio::test]
    async fn removing_newest_moves_latest_to_next_highest() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        for id in [1, 3, 2] {
            store.add(entry(id, "m")).await.unwrap();
        }

        assert!(store.remove(3).await.unwrap());
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.latest_entry().unwrap().id, 2);
        assert_eq!(saved_latest_id(&storage), Some(2));
    }

    #[tokio::test]
    async fn removing_last_entry_deletes_latest_key() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        store.add(entry(7, "m")).await.unwrap();

        assert!(store.remove(7).await.unwrap());
        assert!(store.entries().is_empty());
        assert!(store.latest_entry().is_none());
        assert_eq!(saved_ids(&storage), Vec::<i64>::new());
        assert_eq!(storage.value(LATEST_ENTRY_KEY), None);
    }

    #[tokio::test]
    async fn removing_unknown_id_changes_nothing() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        store.add(entry(7, "m")).await.unwrap();
        storage.set_failing(true);

        assert!(!store.remove(8).await.unwrap());
        assert_eq!(ids(&store), vec![7]);
    }

    #[tokio::test]
    async fn clear_drops_both_keys() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        store.add(entry(1, "a")).await.unwrap();
        store.add(entry(2, "b")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.entries().is_empty());
        assert!(store.latest_entry().is_none());
        assert_eq!(storage.value(ENTRIES_KEY), None);
        assert_eq!(storage.value(LATEST_ENTRY_KEY), None);
    }

    #[tokio::test]
    async fn failed_writes_leave_cache_untouched() {
        let storage = Arc::new(MemoryStore::default());
        let mut store = EntryStore::new(storage.clone());
        store.add(entry(1, "a")).await.unwrap();
        storage.set_failing(true);

        assert!(matches!(
            store.add(entry(2, "b")).await,
            Err(JournalError::Persistence(_))
        ));
        assert!(store.remove(1).await.is_err());
        assert!(store.clear().await.is_err());

        assert_eq!(ids(&store), vec![1]);
        assert_eq!(store.latest_entry().unwrap().id, 1);
        assert_eq!(saved_ids(&storage), vec![1]);
    }

    #[tokio::test]
    async fn load_sorts_snapshot_and_ignores_drifted_pointer() {
        let storage = Arc::new(MemoryStore::default());
        storage
            .set(
                ENTRIES_KEY,
                serde_json::to_string(&vec![entry(1, "a"), entry(3, "c"), entry(2, "b")]).unwrap(),
            )
            .await
            .unwrap();
        storage
            .set(LATEST_ENTRY_KEY, serde_json::to_string(&entry(1, "a")).unwrap())
            .await
            .unwrap();

        let mut store = EntryStore::new(storage.clone());
        store.load().await.unwrap();
        assert_eq!(ids(&store), vec![3, 2, 1]);
        assert_eq!(store.latest_entry().unwrap().message, "c");
    }

    #[tokio::test]
    async fn loads_snapshot_with_null_advice_fields() {
        let storage = Arc::new(MemoryStore::default());
        storage
            .set(
                ENTRIES_KEY,
                r#"[{"id":1714600000000,"message":"Bugün çok iyiyim","sentiment":"Positive","color":null,"summary":null,"suggestion":"Bu hissi sürdür."},
                    {"id":1714500000000,"message":"Dün","sentiment":"Neutral","color":"gray","summary":"Sakin.","suggestion":null}]"#
                    .to_string(),
            )
            .await
            .unwrap();

        let mut store = EntryStore::new(storage);
        store.load().await.unwrap();

        assert_eq!(ids(&store), vec![1714600000000, 1714500000000]);
        let latest = store.latest_entry().unwrap();
        assert_eq!(latest.summary, "");
        assert_eq!(latest.suggestion, "Bu hissi sürdür.");
        assert_eq!(latest.display_color(), "#2effb6");
        assert_eq!(store.entries()[1].summary, "Sakin.");
        assert_eq!(store.entries()[1].suggestion, "");
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_persistence_error() {
        let storage = Arc::new(MemoryStore::default());
        storage.set(ENTRIES_KEY, "{not json".to_string()).await.unwrap();

        let mut store = EntryStore::new(storage);
        assert!(matches!(store.load().await, Err(JournalError::Persistence(_))));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn daily_gate_and_weekly_window() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let day = |d: u32, h: u32| {
            tz.with_ymd_and_hms(2024, 5, d, h, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
                .timestamp_millis()
        };

        let mut store = EntryStore::new(Arc::new(MemoryStore::default()));
        let now = tz.with_ymd_and_hms(2024, 5, 10, 20, 0, 0).unwrap();
        assert!(!store.submitted_today(&now));

        store.add(entry(day(1, 9), "old")).await.unwrap();
        store.add(entry(day(4, 9), "recent")).await.unwrap();
        assert!(!store.submitted_today(&now));

        store.add(entry(day(10, 8), "today")).await.unwrap();
        assert!(store.submitted_today(&now));

        let since = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        let week: Vec<&str> = store
            .entries_since(since, &tz)
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(week, vec!["today", "recent"]);
    }
}
