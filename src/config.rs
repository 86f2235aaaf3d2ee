use crate::error::{JournalError, Result};
use crate::timeout::DEFAULT_PIPELINE_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "MOOD_JOURNAL_CONFIG";
pub const ENV_API_TOKEN: &str = "HF_TOKEN";

const DEFAULT_CLASSIFIER_URL: &str =
    "https://router.huggingface.co/hf-inference/models/tabularisai/multilingual-sentiment-analysis";
const DEFAULT_CHAT_URL: &str = "https://router.huggingface.co/v1/chat/completions";
const DEFAULT_CHAT_MODEL: &str = "deepseek-ai/DeepSeek-R1:novita";
const DEFAULT_CONNECTIVITY_PROBE: &str = "router.huggingface.co:443";
const DEFAULT_CONNECTIVITY_TIMEOUT_MS: u64 = 3_000;
const APP_DIR: &str = "mood-journal";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_pipeline_timeout_ms")]
    pub pipeline_timeout_ms: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_connectivity_probe")]
    pub connectivity_probe: String,
    #[serde(default = "default_connectivity_timeout_ms")]
    pub connectivity_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_token: String::new(),
            classifier_url: default_classifier_url(),
            chat_url: default_chat_url(),
            chat_model: default_chat_model(),
            pipeline_timeout_ms: default_pipeline_timeout_ms(),
            data_dir: default_data_dir(),
            connectivity_probe: default_connectivity_probe(),
            connectivity_timeout_ms: default_connectivity_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Reads the config file named by `MOOD_JOURNAL_CONFIG`, or the default
    /// location, then applies `HF_TOKEN`.
    pub fn load_from_env() -> Result<Self> {
        let path = match std::env::var(ENV_CONFIG_PATH) {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw),
            _ => default_config_path(),
        };
        let mut config = Self::load_from_path(&path)?;
        config.apply_token(std::env::var(ENV_API_TOKEN).ok());
        Ok(config)
    }

    /// A missing file gives the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw)
                .map_err(|e| JournalError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(JournalError::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| JournalError::Config(e.to_string()))?;
        if config.pipeline_timeout_ms == 0 {
            return Err(JournalError::Config(
                "pipeline_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    fn apply_token(&mut self, token: Option<String>) {
        if let Some(token) = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            self.api_token = token;
        }
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline_timeout_ms)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity_timeout_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("mood_journal.log")
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".mood-journal"))
}

fn default_classifier_url() -> String {
    DEFAULT_CLASSIFIER_URL.to_owned()
}

fn default_chat_url() -> String {
    DEFAULT_CHAT_URL.to_owned()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_owned()
}

fn default_pipeline_timeout_ms() -> u64 {
    DEFAULT_PIPELINE_TIMEOUT_MS
}

fn default_connectivity_probe() -> String {
    DEFAULT_CONNECTIVITY_PROBE.to_owned()
}

fn default_connectivity_timeout_ms() -> u64 {
    DEFAULT_CONNECTIVITY_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.pipeline_timeout(), Duration::from_secs(60));
        assert_eq!(config.chat_model, "deepseek-ai/DeepSeek-R1:novita");
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = AppConfig::from_toml_str(
            r#"
            chat_model = "local-model"
            pipeline_timeout_ms = 15000
            data_dir = "/tmp/journal"
            "#,
        )
        .unwrap();
        assert_eq!(config.chat_model, "local-model");
        assert_eq!(config.pipeline_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/journal/mood_journal.log"));
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
    }

    #[test]
    fn rejects_malformed_and_zero_timeout() {
        assert!(matches!(
            AppConfig::from_toml_str("chat_model = "),
            Err(JournalError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("pipeline_timeout_ms = 0"),
            Err(JournalError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn token_override_ignores_blank_values() {
        let mut config = AppConfig::from_toml_str(r#"api_token = "from-file""#).unwrap();
        config.apply_token(Some("   ".to_string()));
        assert_eq!(config.api_token, "from-file");
        config.apply_token(Some("hf_env".to_string()));
        assert_eq!(config.api_token, "hf_env");
    }
}
