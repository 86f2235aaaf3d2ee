use crate::advisor::AdviceGenerator;
use crate::classifier::SentimentClassifier;
use crate::error::{JournalError, Result};
use crate::extract::extract_advice;
use crate::sentiment::{label_sentiment, Sentiment};
use futures::future::try_join;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResponse {
    pub sentiment: Sentiment,
    pub sentiment_color: String,
    pub original_text: String,
    pub summary: String,
    pub suggestion: String,
}

/// Runs sentiment classification and advice generation for one entry.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<dyn SentimentClassifier>,
    advisor: Arc<dyn AdviceGenerator>,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, advisor: Arc<dyn AdviceGenerator>) -> Self {
        Pipeline {
            classifier,
            advisor,
        }
    }

    /// Both backend calls run concurrently. If either fails the whole call
    /// fails, so a half-populated response never reaches the store.
    pub async fn generate_response(&self, text: &str) -> Result<GeneratedResponse> {
        let sentiment = async {
            let result = self.classifier.classify(text).await?;
            Ok::<_, JournalError>(label_sentiment(&result))
        };
        let advice = async {
            let raw = self.advisor.generate(text).await?;
            Ok::<_, JournalError>(extract_advice(&raw))
        };

        let (sentiment, advice) = try_join(sentiment, advice).await.map_err(|err| {
            warn!(%err, "response pipeline failed");
            err
        })?;

        if advice.summary.is_empty() && advice.suggestion.is_empty() {
            info!(%sentiment, "generated response without advice text");
        } else {
            info!(%sentiment, "generated response");
        }

        Ok(GeneratedResponse {
            sentiment,
            sentiment_color: sentiment.color().to_string(),
            original_text: text.to_string(),
            summary: advice.summary,
            suggestion: advice.suggestion,
        })
    }
}
