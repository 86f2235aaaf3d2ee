use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    #[serde(rename = "Very Positive")]
    VeryPositive,
    Negative,
    #[serde(rename = "Very Negative")]
    VeryNegative,
    Neutral,
}

impl Sentiment {
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::VeryPositive => "Very Positive",
            Sentiment::Negative => "Negative",
            Sentiment::VeryNegative => "Very Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Display colour, either a `#rrggbb` hex string or a named colour.
    pub fn color(self) -> &'static str {
        match self {
            Sentiment::Positive => "#2effb6",
            Sentiment::VeryPositive => "green",
            Sentiment::Negative => "#ff0019",
            Sentiment::VeryNegative => "#91010f",
            Sentiment::Neutral => "gray",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

/// Classifier payload: a list of prediction sets, only the first is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationResult(pub Vec<Vec<Prediction>>);

impl ClassificationResult {
    pub fn predictions(&self) -> &[Prediction] {
        self.0.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Maps a raw classifier label. Anything unrecognised is `Neutral`.
pub fn map_label(label: &str) -> Sentiment {
    match label {
        "Positive" => Sentiment::Positive,
        "Very Positive" => Sentiment::VeryPositive,
        "Negative" => Sentiment::Negative,
        "Very Negative" => Sentiment::VeryNegative,
        _ => Sentiment::Neutral,
    }
}

/// Highest scoring prediction; on equal scores the earlier one wins.
pub fn best_prediction(predictions: &[Prediction]) -> Option<&Prediction> {
    predictions.iter().reduce(|best, current| {
        if current.score > best.score {
            current
        } else {
            best
        }
    })
}

pub fn label_sentiment(result: &ClassificationResult) -> Sentiment {
    best_prediction(result.predictions())
        .map(|p| map_label(&p.label))
        .unwrap_or(Sentiment::Neutral)
}
