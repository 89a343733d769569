//! Core data models for the voice summarizer

use crate::error::VoiceAgentError;
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use uuid::Uuid;

/// Label used when the month has no expense records.
pub const NO_EXPENSE_CATEGORY: &str = "none";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    /// Exact match against the `main_category` column.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "income" => Some(CategoryKind::Income),
            "expense" => Some(CategoryKind::Expense),
            _ => None,
        }
    }
}

/// Coarse verdict on the month, handed to the script generator as a hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FinancialHealth {
    Healthy,
    Tight,
    Critical,
}

impl fmt::Display for FinancialHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinancialHealth::Healthy => "sehat",
            FinancialHealth::Tight => "menipis",
            FinancialHealth::Critical => "kritis",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Ledger =================
//

/// One row of the monthly ledger query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub amount: Decimal,
    pub category_main: String,
    pub category_name: String,
}

impl LedgerRow {
    pub fn new(amount: Decimal, category_main: &str, category_name: &str) -> Self {
        Self {
            amount,
            category_main: category_main.to_string(),
            category_name: category_name.to_string(),
        }
    }

    pub fn kind(&self) -> Option<CategoryKind> {
        CategoryKind::from_db(&self.category_main)
    }
}

//
// ================= Summary =================
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub income: Decimal,
    pub expense: Decimal,
    /// Always `income - expense`.
    pub balance: Decimal,
    pub top_expense_category: String,
}

impl MonthlySummary {
    /// Aggregate the rows of one month.
    ///
    /// Totals that overflow `Decimal` make the month unusable, so they are
    /// reported as `DataUnavailable` like any other bad ledger data.
    pub fn from_rows(rows: &[LedgerRow]) -> Result<Self> {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;

        // name -> index into `totals`, keeps first-seen order for the max scan
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut totals: Vec<(&str, Decimal)> = Vec::new();

        for row in rows {
            match row.kind() {
                Some(CategoryKind::Income) => income = add_amount(income, row, "income")?,
                Some(CategoryKind::Expense) => {
                    expense = add_amount(expense, row, "expense")?;
                    match index.get(row.category_name.as_str()) {
                        Some(&i) => {
                            totals[i].1 = add_amount(totals[i].1, row, &row.category_name)?
                        }
                        None => {
                            index.insert(row.category_name.as_str(), totals.len());
                            totals.push((row.category_name.as_str(), row.amount));
                        }
                    }
                }
                None => {}
            }
        }

        let mut top: Option<(&str, Decimal)> = None;
        for &(name, total) in &totals {
            if top.map_or(true, |(_, best)| total > best) {
                top = Some((name, total));
            }
        }

        let balance = income.checked_sub(expense).ok_or_else(|| {
            VoiceAgentError::DataUnavailable("Ledger balance overflows".to_string())
        })?;

        Ok(Self {
            income,
            expense,
            balance,
            top_expense_category: top
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| NO_EXPENSE_CATEGORY.to_string()),
        })
    }

    pub fn has_top_category(&self) -> bool {
        self.top_expense_category != NO_EXPENSE_CATEGORY
    }

    pub fn health(&self) -> FinancialHealth {
        if self.balance < Decimal::ZERO {
            FinancialHealth::Critical
        } else if self.balance <= self.income / Decimal::from(5) {
            FinancialHealth::Tight
        } else {
            FinancialHealth::Healthy
        }
    }
}

fn add_amount(total: Decimal, row: &LedgerRow, label: &str) -> Result<Decimal> {
    total.checked_add(row.amount).ok_or_else(|| {
        VoiceAgentError::DataUnavailable(format!("Ledger {} total overflows", label))
    })
}

//
// ================= Script =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOrigin {
    /// Written by the script generator, markup already stripped.
    Generated,
    /// Fixed apology, ledger data was unavailable.
    NoData,
    /// Fixed fallback, script generator failed.
    GeneratorUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceScript {
    pub text: String,
    pub origin: ScriptOrigin,
}

impl VoiceScript {
    pub fn new(text: impl Into<String>, origin: ScriptOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin != ScriptOrigin::Generated
    }
}

//
// ================= Audio =================
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceAudio {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl VoiceAudio {
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "audio/mpeg",
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// In-memory stream positioned at the first byte.
    pub fn into_stream(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes)
    }
}

/// Outcome of one summarizer run: audio when synthesis worked, and either
/// the spoken script or the synthesis error message.
#[derive(Debug, Clone)]
pub struct VoiceReport {
    pub run_id: Uuid,
    pub audio: Option<VoiceAudio>,
    pub message: String,
}

impl VoiceReport {
    pub fn is_spoken(&self) -> bool {
        self.audio.is_some()
    }
}
