use crate::error::{JournalError, Result};
use crate::sentiment::ClassificationResult;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

/// Hugging Face style text-classification endpoint.
pub struct HfClassifier {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl HfClassifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl SentimentClassifier for HfClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        debug!(url = %self.url, "requesting sentiment classification");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&ClassifyRequest { inputs: text })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(%status, %body, "classifier request failed");
            return Err(JournalError::inference(format!(
                "classifier returned {status}: {body}"
            )));
        }

        let result: ClassificationResult = resp
            .json()
            .await
            .map_err(|e| JournalError::inference(format!("malformed classifier payload: {e}")))?;

        if result.predictions().is_empty() {
            return Err(JournalError::inference("classifier returned no predictions"));
        }

        Ok(result)
    }
}
