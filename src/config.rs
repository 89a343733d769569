//! Configuration for the voice summarizer.
//!
//! Clients are configured from an explicit struct handed to the
//! summarizer's constructor. `from_env` is a convenience for the binary.

use crate::error::VoiceAgentError;
use crate::Result;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            timeout_secs: 30,
        }
    }
}

impl GeminiConfig {
    /// Full `generateContent` endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Spoken language code.
    pub language: String,
    pub slow: bool,
    /// Top-level domain of the translate host (`com`, `co.id`, ...).
    pub tld: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "id".into(),
            slow: false,
            tld: "com".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VoiceAgentConfig {
    pub gemini: GeminiConfig,
    pub speech: SpeechConfig,
}

impl VoiceAgentConfig {
    /// Defaults everywhere except the Gemini credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            gemini: GeminiConfig {
                api_key: api_key.into(),
                ..GeminiConfig::default()
            },
            speech: SpeechConfig::default(),
        }
    }

    /// Load from process environment (and `.env` if present).
    ///
    /// `GEMINI_API_KEY` is required; `GEMINI_MODEL`, `GEMINI_TIMEOUT_SECS`,
    /// `TTS_LANG`, `TTS_SLOW` and `TTS_TLD` override the defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        let mut config = Self::with_api_key(api_key);

        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(secs) = parse_var("GEMINI_TIMEOUT_SECS")? {
            config.gemini.timeout_secs = secs;
        }
        if let Ok(language) = env::var("TTS_LANG") {
            config.speech.language = language;
        }
        if let Some(slow) = parse_var("TTS_SLOW")? {
            config.speech.slow = slow;
        }
        if let Ok(tld) = env::var("TTS_TLD") {
            config.speech.tld = tld;
        }

        config.validate()?;
        info!(
            model = %config.gemini.model,
            language = %config.speech.language,
            "Configuration loaded from environment"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let key = self.gemini.api_key.trim();
        if key.is_empty() || key == "your_gemini_api_key_here" {
            return Err(VoiceAgentError::ConfigError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }
        if self.speech.language.trim().is_empty() {
            return Err(VoiceAgentError::ConfigError(
                "speech language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            VoiceAgentError::ConfigError(format!("{} has invalid value '{}': {}", name, raw, e))
        }),
        Err(_) => Ok(None),
    }
}
