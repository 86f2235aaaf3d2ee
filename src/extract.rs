use serde::{Deserialize, Deserializer};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Advice {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestion: String,
}

/// Reads a string field where `null` means empty.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Pulls `{summary, suggestion}` out of model output that may wrap the JSON
/// object in prose. Takes the span from the first `{` to the last `}`.
/// Never fails: anything unparseable yields empty strings.
pub fn extract_advice(raw: &str) -> Advice {
    let span = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            debug!("no JSON object in generated text");
            return Advice::default();
        }
    };

    match serde_json::from_str::<Advice>(span) {
        Ok(advice) => advice,
        Err(err) => {
            debug!(%err, "could not parse generated advice");
            Advice::default()
        }
    }
}
