use crate::error::{JournalError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    /// Raw completion text. Empty when the backend answered without content.
    async fn generate(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"Destekleyici bir arkadaşsın.
Aşağıdaki metni oku ve iki şey üret:

1. Özet: 1-2 kısa, empatik özetleyici cümle; teşvik edici ve samimi olsun.
2. Öneri: 1-2 kısa, empatik öneri içeren cümle; yardımcı ve yol gösterici olsun.

Yanıtı yalnızca JSON formatında ve yalnızca şu iki anahtar ile döndür:
"summary" ve "suggestion".

Açıklama, alıntı, yorum veya ekstra metin ekleme.
Cümleleri Türkçe yaz.

Metin: "{text}""#
    )
}

/// OpenAI-compatible chat completions endpoint.
pub struct ChatAdvisor {
    client: reqwest::Client,
    url: String,
    token: String,
    model: String,
}

impl ChatAdvisor {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        token: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            token: token.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl AdviceGenerator for ChatAdvisor {
    async fn generate(&self, text: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(text),
            }],
        };
        debug!(url = %self.url, model = %self.model, "requesting advice completion");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(%status, %body, "chat completion request failed");
            return Err(JournalError::inference(format!(
                "chat completion returned {status}: {body}"
            )));
        }

        let body = resp.text().await?;
        let parsed: ChatResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "unexpected chat completion shape");
                ChatResponse::default()
            }
        };

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}
