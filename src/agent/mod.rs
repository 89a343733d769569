//! Financial voice summarizer - the three-step pipeline
//!
//! LEDGER → SUMMARY → SCRIPT → SPEECH
//!
//! Every step is awaited in order. Ledger and generator failures degrade to
//! fixed scripts; a synthesis failure ends the run with a message and no
//! audio. `run` never returns an error.

use crate::config::VoiceAgentConfig;
use crate::error::VoiceAgentError;
use crate::gemini::GeminiClient;
use crate::ledger::{monthly_summary, LedgerStore};
use crate::models::{MonthlySummary, ScriptOrigin, VoiceAudio, VoiceReport, VoiceScript};
use crate::script::{
    build_prompt, strip_markup, ScriptGenerator, GENERATOR_DOWN_SCRIPT, NO_DATA_SCRIPT,
};
use crate::speech::{GoogleTts, SpeechSynthesizer};
use crate::Result;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Prefix of the message returned when no audio could be produced.
pub const SYNTHESIS_FAILED_PREFIX: &str = "Gagal membuat suara";

pub struct FinancialVoiceSummarizer {
    generator: Box<dyn ScriptGenerator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl FinancialVoiceSummarizer {
    pub fn new(
        generator: Box<dyn ScriptGenerator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            generator,
            synthesizer,
        }
    }

    /// Gemini for scripts, Google Translate for speech.
    pub fn from_config(config: &VoiceAgentConfig) -> Result<Self> {
        config.validate()?;
        let generator = GeminiClient::new(&config.gemini)?;
        let synthesizer = GoogleTts::new(&config.speech)?;
        Ok(Self::new(Box::new(generator), Box::new(synthesizer)))
    }

    /// Income, expense, balance and top expense category since the first
    /// instant of the current local month.
    pub async fn compute_monthly_summary(
        &self,
        ledger: &dyn LedgerStore,
    ) -> Result<MonthlySummary> {
        monthly_summary(ledger).await
    }

    /// Script for the summary, or a fixed fallback. Never fails.
    pub async fn generate_script(&self, summary: Option<&MonthlySummary>) -> VoiceScript {
        let Some(summary) = summary else {
            info!("No ledger data, using apology script");
            return VoiceScript::new(NO_DATA_SCRIPT, ScriptOrigin::NoData);
        };

        let prompt = build_prompt(summary);
        debug!(prompt_chars = prompt.chars().count(), "Script prompt built");

        let generated = self.generator.generate(&prompt).await.and_then(|raw| {
            let text = strip_markup(&raw);
            if text.is_empty() {
                Err(VoiceAgentError::GenerationFailure(
                    "generator returned no speakable text".to_string(),
                ))
            } else {
                Ok(text)
            }
        });

        match generated {
            Ok(text) => {
                info!(chars = text.chars().count(), "Script generated");
                VoiceScript::new(text, ScriptOrigin::Generated)
            }
            Err(e) => {
                warn!("Script generation failed, using fallback: {}", e);
                VoiceScript::new(GENERATOR_DOWN_SCRIPT, ScriptOrigin::GeneratorUnavailable)
            }
        }
    }

    /// Speak the script. The error, if any, is terminal for the run.
    pub async fn synthesize_speech(&self, script: &VoiceScript) -> Result<VoiceAudio> {
        let audio = self.synthesizer.synthesize(&script.text).await?;
        if audio.is_empty() {
            return Err(VoiceAgentError::SynthesisFailure(
                "synthesizer returned no audio".to_string(),
            ));
        }
        Ok(audio)
    }

    /// Fetch data → generate text → synthesize audio.
    pub async fn run(&self, ledger: &dyn LedgerStore) -> VoiceReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(run_id = %run_id, "Voice summary run started");

        let summary = match self.compute_monthly_summary(ledger).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(run_id = %run_id, "Ledger unavailable: {}", e);
                None
            }
        };

        let script = self.generate_script(summary.as_ref()).await;

        match self.synthesize_speech(&script).await {
            Ok(audio) => {
                info!(
                    run_id = %run_id,
                    audio_bytes = audio.len(),
                    fallback = script.is_fallback(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Voice summary ready"
                );
                VoiceReport {
                    run_id,
                    audio: Some(audio),
                    message: script.text,
                }
            }
            Err(e) => {
                error!(run_id = %run_id, "Speech synthesis failed: {}", e);
                VoiceReport {
                    run_id,
                    audio: None,
                    message: synthesis_failure_message(&e),
                }
            }
        }
    }
}

fn synthesis_failure_message(err: &VoiceAgentError) -> String {
    let detail = match err {
        VoiceAgentError::SynthesisFailure(detail) => detail.clone(),
        other => other.to_string(),
    };
    format!("{}: {}", SYNTHESIS_FAILED_PREFIX, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerRow;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FixedLedger(Vec<LedgerRow>);

    #[async_trait::async_trait]
    impl LedgerStore for FixedLedger {
        async fn fetch_records(&self, _since: NaiveDateTime) -> Result<Vec<LedgerRow>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenLedger;

    #[async_trait::async_trait]
    impl LedgerStore for BrokenLedger {
        async fn fetch_records(&self, _since: NaiveDateTime) -> Result<Vec<LedgerRow>> {
            Err(VoiceAgentError::DataUnavailable("connection refused".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeGenerator {
        reply: Option<String>,
        calls: Arc<AtomicUsize>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl ScriptGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| VoiceAgentError::GenerationFailure("timeout".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeSynthesizer {
        fail: bool,
        spoken: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<VoiceAudio> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(VoiceAgentError::SynthesisFailure("HTTP 429".to_string()))
            } else {
                Ok(VoiceAudio::mpeg(text.as_bytes().to_vec()))
            }
        }
    }

    fn summarizer(
        generator: &FakeGenerator,
        synthesizer: &FakeSynthesizer,
    ) -> FinancialVoiceSummarizer {
        FinancialVoiceSummarizer::new(Box::new(generator.clone()), Box::new(synthesizer.clone()))
    }

    fn scenario_rows() -> Vec<LedgerRow> {
        vec![
            LedgerRow::new(dec!(500000), "income", "salary"),
            LedgerRow::new(dec!(200000), "expense", "food"),
            LedgerRow::new(dec!(100000), "expense", "transport"),
        ]
    }

    #[tokio::test]
    async fn test_compute_monthly_summary() {
        let agent = summarizer(&FakeGenerator::default(), &FakeSynthesizer::default());

        let summary = agent
            .compute_monthly_summary(&FixedLedger(scenario_rows()))
            .await
            .unwrap();
        assert_eq!(summary.income, dec!(500000));
        assert_eq!(summary.expense, dec!(300000));
        assert_eq!(summary.balance, dec!(200000));
        assert_eq!(summary.top_expense_category, "food");

        let err = agent.compute_monthly_summary(&BrokenLedger).await.unwrap_err();
        assert!(matches!(err, VoiceAgentError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_full_run_strips_markup_before_synthesis() {
        let generator = FakeGenerator {
            reply: Some(
                "## Halo!\n**Keuanganmu sehat**, tapi kurangi *jajan* ya. #semangat".into(),
            ),
            ..FakeGenerator::default()
        };
        let synthesizer = FakeSynthesizer::default();
        let agent = summarizer(&generator, &synthesizer);

        let report = agent.run(&FixedLedger(scenario_rows())).await;

        assert!(report.is_spoken());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(generator.prompts.lock().unwrap()[0].contains("Rp 200,000"));

        let spoken = synthesizer.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert!(!spoken[0].contains('*') && !spoken[0].contains('#'));
        assert_eq!(report.message, spoken[0]);
        assert_eq!(report.audio.unwrap().bytes, spoken[0].as_bytes());
    }

    #[tokio::test]
    async fn test_unavailable_ledger_speaks_apology() {
        let generator = FakeGenerator {
            reply: Some("should not be used".into()),
            ..FakeGenerator::default()
        };
        let synthesizer = FakeSynthesizer::default();
        let agent = summarizer(&generator, &synthesizer);

        let report = agent.run(&BrokenLedger).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*synthesizer.spoken.lock().unwrap(), vec![NO_DATA_SCRIPT.to_string()]);
        assert_eq!(report.message, NO_DATA_SCRIPT);
        assert!(report.is_spoken());
    }

    #[tokio::test]
    async fn test_overflowing_ledger_speaks_apology() {
        let generator = FakeGenerator {
            reply: Some("should not be used".into()),
            ..FakeGenerator::default()
        };
        let synthesizer = FakeSynthesizer::default();
        let agent = summarizer(&generator, &synthesizer);

        let ledger = FixedLedger(vec![
            LedgerRow::new(dec!(50000000000000000000000000000), "income", "salary"),
            LedgerRow::new(dec!(50000000000000000000000000000), "income", "bonus"),
        ]);
        let report = agent.run(&ledger).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*synthesizer.spoken.lock().unwrap(), vec![NO_DATA_SCRIPT.to_string()]);
        assert_eq!(report.message, NO_DATA_SCRIPT);
        assert!(report.is_spoken());
    }

    #[tokio::test]
    async fn test_generator_failure_speaks_fallback() {
        let generator = FakeGenerator::default();
        let synthesizer = FakeSynthesizer::default();
        let agent = summarizer(&generator, &synthesizer);

        let report = agent.run(&FixedLedger(scenario_rows())).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *synthesizer.spoken.lock().unwrap(),
            vec![GENERATOR_DOWN_SCRIPT.to_string()]
        );
        assert_eq!(report.message, GENERATOR_DOWN_SCRIPT);
    }

    #[tokio::test]
    async fn test_markup_only_reply_falls_back() {
        let generator = FakeGenerator {
            reply: Some(" *** ## ".into()),
            ..FakeGenerator::default()
        };
        let agent = summarizer(&generator, &FakeSynthesizer::default());

        let summary = MonthlySummary::from_rows(&scenario_rows()).unwrap();
        let script = agent.generate_script(Some(&summary)).await;
        assert_eq!(script.origin, ScriptOrigin::GeneratorUnavailable);
        assert_eq!(script.text, GENERATOR_DOWN_SCRIPT);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_terminal() {
        let generator = FakeGenerator {
            reply: Some("Halo! Bulan ini aman.".into()),
            ..FakeGenerator::default()
        };
        let synthesizer = FakeSynthesizer {
            fail: true,
            ..FakeSynthesizer::default()
        };
        let agent = summarizer(&generator, &synthesizer);

        let report = agent.run(&FixedLedger(scenario_rows())).await;

        assert!(report.audio.is_none());
        assert_eq!(synthesizer.spoken.lock().unwrap().len(), 1);
        assert_eq!(report.message, "Gagal membuat suara: HTTP 429");
    }

    #[tokio::test]
    async fn test_everything_down_still_attempts_synthesis_once() {
        let generator = FakeGenerator::default();
        let synthesizer = FakeSynthesizer {
            fail: true,
            ..FakeSynthesizer::default()
        };
        let agent = summarizer(&generator, &synthesizer);

        let report = agent.run(&BrokenLedger).await;

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*synthesizer.spoken.lock().unwrap(), vec![NO_DATA_SCRIPT.to_string()]);
        assert!(report.message.starts_with(SYNTHESIS_FAILED_PREFIX));
        assert!(!report.is_spoken());
    }

    #[tokio::test]
    async fn test_empty_month_prompt() {
        let generator = FakeGenerator {
            reply: Some("Halo! Belum ada transaksi bulan ini.".into()),
            ..FakeGenerator::default()
        };
        let agent = summarizer(&generator, &FakeSynthesizer::default());

        let summary = agent.compute_monthly_summary(&FixedLedger(vec![])).await.unwrap();
        assert_eq!(summary.top_expense_category, "none");

        let script = agent.generate_script(Some(&summary)).await;
        assert_eq!(script.origin, ScriptOrigin::Generated);
        assert!(generator.prompts.lock().unwrap()[0].contains("boros: belum ada"));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let result = FinancialVoiceSummarizer::from_config(&VoiceAgentConfig::default());
        assert!(matches!(result, Err(VoiceAgentError::ConfigError(_))));
    }
}
