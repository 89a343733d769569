//! Financial Voice Summarizer
//!
//! Reads the current month's income and expense records from a personal
//! finance ledger, asks a hosted language model for a short conversational
//! script about them, and turns that script into speech.
//!
//! PIPELINE:
//! LEDGER → SUMMARY → SCRIPT → SPEECH

pub mod agent;
pub mod config;
pub mod error;
pub mod gemini;
pub mod ledger;
pub mod models;
pub mod script;
pub mod speech;

pub use error::Result;

// Re-export common types
pub use agent::FinancialVoiceSummarizer;
pub use config::VoiceAgentConfig;
pub use error::VoiceAgentError;
pub use ledger::{LedgerStore, SqliteLedger};
pub use models::*;
