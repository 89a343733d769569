//! Gemini API client used as the script generator
//!
//! Single `generateContent` call per prompt, no streaming, no conversation
//! state. Uses a long-lived reqwest::Client for connection pooling.
//!
//! The API key travels in the `x-goog-api-key` header and reqwest errors are
//! stripped of their URL before they are logged or returned.

use crate::config::GeminiConfig;
use crate::error::VoiceAgentError;
use crate::script::ScriptGenerator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint(),
            model: config.model.clone(),
        })
    }

    /// Generate text for a single prompt
    pub async fn generate_content(&self, prompt: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(VoiceAgentError::GenerationFailure(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            // no maxOutputTokens: 2.5 models spend thinking tokens against it
            generation_config: GenerationConfig {
                temperature: 0.8,
                top_p: 0.95,
            },
        };

        info!(model = %self.model, "Calling Gemini API");
        debug!(prompt_chars = prompt.chars().count(), "Gemini prompt built");

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                VoiceAgentError::GenerationFailure(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(VoiceAgentError::GenerationFailure(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            VoiceAgentError::GenerationFailure(format!("Gemini parse error: {}", e))
        })?;

        let answer = extract_text(&gemini_response)?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }
        info!(chars = answer.chars().count(), "Gemini response received");

        Ok(answer)
    }
}

#[async_trait::async_trait]
impl ScriptGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> crate::Result<String> {
        self.generate_content(prompt).await
    }
}

/// First text part of the first candidate.
fn extract_text(response: &GeminiResponse) -> crate::Result<String> {
    let candidate = response.candidates.first().ok_or_else(|| {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .unwrap_or_else(|| "no candidates".to_string());
        VoiceAgentError::GenerationFailure(format!("No response from Gemini API ({})", reason))
    })?;

    candidate
        .content
        .as_ref()
        .and_then(|c| c.parts.iter().find(|p| !p.text.trim().is_empty()))
        .map(|p| p.text.clone())
        .ok_or_else(|| {
            VoiceAgentError::GenerationFailure(format!(
                "Empty response from Gemini (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
