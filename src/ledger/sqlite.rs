//! SQLite ledger store
//!
//! Opens one connection per fetch and always closes it, whether or not the
//! query succeeded. Only ever issues a SELECT.

use super::{LedgerStore, TIMESTAMP_FORMAT};
use crate::error::VoiceAgentError;
use crate::models::LedgerRow;
use crate::Result;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

const MONTHLY_RECORDS_QUERY: &str = r#"
    SELECT CAST(r.amount AS TEXT) AS amount,
           c.main_category AS main_category,
           c.name AS name
    FROM records r
    JOIN categories c ON r.category_id = c.id
    WHERE r.timestamp >= ?
"#;

pub struct SqliteLedger {
    path: PathBuf,
}

impl SqliteLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteLedger {
    async fn fetch_records(&self, since: NaiveDateTime) -> Result<Vec<LedgerRow>> {
        let bound = since.format(TIMESTAMP_FORMAT).to_string();

        let mut conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(false)
            .connect()
            .await
            .map_err(|e| {
                VoiceAgentError::DataUnavailable(format!(
                    "Failed to open ledger {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let fetched = sqlx::query(MONTHLY_RECORDS_QUERY)
            .bind(bound.as_str())
            .fetch_all(&mut conn)
            .await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close ledger connection: {}", e);
        }

        let rows = fetched.map_err(|e| {
            VoiceAgentError::DataUnavailable(format!("Ledger query failed: {}", e))
        })?;

        debug!(since = %bound, row_count = rows.len(), "Ledger records fetched");

        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &SqliteRow) -> Result<LedgerRow> {
    let amount: Option<String> = row.try_get("amount").map_err(decode_error)?;
    let category_main: String = row.try_get("main_category").map_err(decode_error)?;
    let category_name: String = row.try_get("name").map_err(decode_error)?;

    let amount = amount.ok_or_else(|| {
        VoiceAgentError::DataUnavailable(format!("Record in '{}' has no amount", category_name))
    })?;

    Ok(LedgerRow {
        amount: parse_amount(&amount)?,
        category_main,
        category_name,
    })
}

fn decode_error(e: sqlx::Error) -> VoiceAgentError {
    VoiceAgentError::DataUnavailable(format!("Malformed ledger row: {}", e))
}

/// Parse the text form of a numeric column (`1500`, `1500.25`, `1.5e+20`).
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| {
            VoiceAgentError::DataUnavailable(format!("Invalid amount '{}': {}", raw, e))
        })
}
