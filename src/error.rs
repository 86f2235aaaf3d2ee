use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("entry text is empty")]
    Validation,
    #[error("no network connection")]
    Connectivity,
    #[error("inference request failed: {0}")]
    Inference(String),
    #[error("response pipeline timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("storage failure: {0}")]
    Persistence(String),
    #[error("an entry was already submitted today")]
    AlreadySubmittedToday,
    #[error("entry {0} already exists")]
    DuplicateEntry(i64),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl JournalError {
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }
}

impl From<reqwest::Error> for JournalError {
    fn from(err: reqwest::Error) -> Self {
        Self::Inference(err.to_string())
    }
}

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
