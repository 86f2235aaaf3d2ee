use crate::extract::null_as_empty;
use crate::pipeline::GeneratedResponse;
use crate::sentiment::Sentiment;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Creation time in milliseconds since the epoch. Also the sort key.
    pub id: i64,
    pub message: String,
    pub sentiment: Sentiment,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub color: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestion: String,
}

impl JournalEntry {
    pub fn new(id: i64, response: GeneratedResponse) -> Self {
        JournalEntry {
            id,
            message: response.original_text,
            sentiment: response.sentiment,
            color: response.sentiment_color,
            summary: response.summary,
            suggestion: response.suggestion,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Local>> {
        DateTime::<Utc>::from_timestamp_millis(self.id).map(|t| t.with_timezone(&Local))
    }

    pub fn day_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp_millis(self.id).map(|t| t.with_timezone(tz).date_naive())
    }

    pub fn display_color(&self) -> &str {
        if self.color.is_empty() {
            self.sentiment.color()
        } else {
            &self.color
        }
    }
}

/// True when the entry was created on the same calendar day as `now`, in
/// `now`'s time zone.
pub fn same_calendar_day<Tz: TimeZone>(entry: &JournalEntry, now: &DateTime<Tz>) -> bool {
    entry.day_in(&now.timezone()) == Some(now.date_naive())
}
