//! Google Translate text-to-speech.
//!
//! Posts `jQ1olc` RPCs to the translate web endpoint, one per text chunk,
//! and concatenates the base64-decoded MP3 fragments in order.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::{split_text, SpeechSynthesizer};
use crate::config::SpeechConfig;
use crate::error::VoiceAgentError;
use crate::models::VoiceAudio;
use crate::Result;

const TTS_RPC_ID: &str = "jQ1olc";

/// Longest text the endpoint accepts per request.
const MAX_CHUNK_CHARS: usize = 100;

const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";

pub struct GoogleTts {
    client: Client,
    language: String,
    slow: bool,
    endpoint: String,
    referer: String,
}

impl GoogleTts {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            language: config.language.clone(),
            slow: config.slow,
            endpoint: format!(
                "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
                config.tld
            ),
            referer: format!("http://translate.google.{}/", config.tld),
        })
    }

    async fn synthesize_chunk(&self, chunk: &str) -> Result<Vec<u8>> {
        let payload = rpc_payload(chunk, &self.language, self.slow)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(REFERER, self.referer.as_str())
            .header(USER_AGENT, BROWSER_AGENT)
            .form(&[("f.req", payload)])
            .send()
            .await
            .map_err(|e| VoiceAgentError::SynthesisFailure(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceAgentError::SynthesisFailure(format!(
                "speech endpoint returned {} for language '{}'",
                status, self.language
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VoiceAgentError::SynthesisFailure(format!("unreadable response: {}", e)))?;

        extract_audio(&body)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<VoiceAudio> {
        let t_start = Instant::now();

        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(VoiceAgentError::SynthesisFailure("No text to speak".to_string()));
        }
        debug!(chunks = chunks.len(), language = %self.language, "Synthesizing speech");

        let mut bytes = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            match self.synthesize_chunk(chunk).await {
                Ok(audio) => bytes.extend_from_slice(&audio),
                Err(e) => {
                    error!(chunk = i, "Speech chunk failed: {}", e);
                    return Err(e);
                }
            }
        }

        let latency_ms = t_start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "Synthesized {} chars into {} bytes ({latency_ms:.0}ms)",
            text.chars().count(),
            bytes.len()
        );

        Ok(VoiceAudio::mpeg(bytes))
    }
}

/// Value of the `f.req` form field for one chunk.
fn rpc_payload(text: &str, language: &str, slow: bool) -> Result<String> {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = serde_json::to_string(&json!([text, language, speed, "null"]))?;
    let rpc = json!([[[TTS_RPC_ID, parameter, Value::Null, "generic"]]]);
    Ok(serde_json::to_string(&rpc)?)
}

/// Pull the base64 audio out of a batchexecute response body.
fn extract_audio(body: &str) -> Result<Vec<u8>> {
    let marker = format!("{}\",\"[\\\"", TTS_RPC_ID);

    let line = body
        .lines()
        .find(|line| line.contains(TTS_RPC_ID))
        .ok_or_else(|| {
            VoiceAgentError::SynthesisFailure("no audio in speech response".to_string())
        })?;

    let encoded = line
        .find(&marker)
        .map(|start| &line[start + marker.len()..])
        .and_then(|rest| rest.find("\\\"").map(|end| &rest[..end]))
        .filter(|encoded| !encoded.is_empty())
        .ok_or_else(|| {
            VoiceAgentError::SynthesisFailure(
                "speech response did not contain audio data".to_string(),
            )
        })?;

    STANDARD
        .decode(encoded)
        .map_err(|e| VoiceAgentError::SynthesisFailure(format!("invalid audio payload: {}", e)))
}
