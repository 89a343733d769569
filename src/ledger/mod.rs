//! Ledger store access
//!
//! The ledger is an external relational database of dated, categorized
//! records. This module only reads it: one query per summary, filtered by a
//! timestamp lower bound.

pub mod sqlite;

use crate::models::{LedgerRow, MonthlySummary};
use crate::Result;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use tracing::info;

pub use sqlite::SqliteLedger;

/// Format of the `records.timestamp` column and of the query bound.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Trait for ledger stores
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// All records with `timestamp >= since`.
    async fn fetch_records(&self, since: NaiveDateTime) -> Result<Vec<LedgerRow>>;
}

/// First instant of the calendar month containing `now`.
pub fn month_start(now: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(now)
}

/// Summary of every record since the first instant of the current local
/// month. Any store or aggregation failure is returned as is; no partial
/// summary.
pub async fn monthly_summary(store: &dyn LedgerStore) -> Result<MonthlySummary> {
    let since = month_start(Local::now().naive_local());
    let rows = store.fetch_records(since).await?;
    let summary = MonthlySummary::from_rows(&rows)?;

    info!(
        records = rows.len(),
        income = %summary.income,
        expense = %summary.expense,
        balance = %summary.balance,
        top_category = %summary.top_expense_category,
        "Monthly summary computed"
    );
    Ok(summary)
}
