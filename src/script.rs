//! Spoken-script generation
//!
//! Builds the instruction sent to the script generator and cleans its reply
//! so that nothing but plain prose reaches the speech synthesizer.

use crate::models::MonthlySummary;
use crate::Result;
use rust_decimal::Decimal;

/// Spoken when the ledger could not be read.
pub const NO_DATA_SCRIPT: &str = "Maaf, saya tidak bisa mengakses data keuangan saat ini.";

/// Spoken when the script generator failed.
pub const GENERATOR_DOWN_SCRIPT: &str =
    "Halo! Maaf, sistem otak saya sedang gangguan, jadi belum bisa kasih analisis lengkap.";

/// Hard ceiling requested from the generator.
pub const MAX_SCRIPT_CHARS: usize = 400;

/// Characters that would be read out loud by the synthesizer.
const MARKUP_CHARS: [char; 4] = ['*', '#', '_', '`'];

/// Trait for script generators (hosted text-completion models)
#[async_trait::async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Instruction for one month's script.
pub fn build_prompt(summary: &MonthlySummary) -> String {
    let top_category = if summary.has_top_category() {
        summary.top_expense_category.as_str()
    } else {
        "belum ada"
    };

    format!(
        r#"Buatkan naskah singkat (maksimal {max} karakter) untuk diucapkan oleh asisten keuangan pribadi.
Gaya bahasa: Santai, akrab, suportif, bahasa Indonesia gaul tapi sopan.
JANGAN gunakan simbol markdown (seperti bintang * atau pagar #) karena ini untuk suara.

Data Keuangan User Bulan Ini:
- Pemasukan: {income}
- Pengeluaran: {expense}
- Sisa Uang: {balance}
- Kategori paling boros: {top_category}
- Indikasi kondisi: {health}

Struktur naskah:
1. Sapa user dengan ramah.
2. Bacakan kondisi keuangannya (sehat/kritis) berdasarkan sisa uang.
3. Sentil sedikit soal kategori paling boros (jika ada).
4. Tutup dengan semangat."#,
        max = MAX_SCRIPT_CHARS,
        income = format_rupiah(summary.income),
        expense = format_rupiah(summary.expense),
        balance = format_rupiah(summary.balance),
        top_category = top_category,
        health = summary.health(),
    )
}

/// Drop emphasis/heading markers and surrounding whitespace.
pub fn strip_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !MARKUP_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `Rp 1,234,568`: thousands separators, no decimals, half-to-even rounding.
pub fn format_rupiah(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("Rp {}{}", sign, grouped)
}
