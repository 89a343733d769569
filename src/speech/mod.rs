//! Text-to-speech
//!
//! The synthesizer is an external service; this module holds the trait the
//! summarizer talks to and the Google Translate implementation.

pub mod google;

use crate::models::VoiceAudio;
use crate::Result;

pub use google::GoogleTts;

/// Trait for text-to-speech providers.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the whole text into one audio artifact.
    async fn synthesize(&self, text: &str) -> Result<VoiceAudio>;
}

/// Split text into pieces of at most `max_chars` characters on whitespace.
/// Words longer than `max_chars` are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_text("  Halo   semua!  ", 100), vec!["Halo semua!"]);
        assert!(split_text("   ", 100).is_empty());
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = "Halo! Bulan ini pemasukanmu lima ratus ribu, pengeluaran tiga ratus ribu. \
                    Sisa dua ratus ribu, masih aman kok. Tapi jajan makanan lumayan banyak ya. \
                    Semangat terus!";
        let chunks = split_text(text, 40);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_long_word_is_cut() {
        let chunks = split_text("aa bbbbbbb c", 3);
        assert_eq!(chunks, vec!["aa", "bbb", "bbb", "b", "c"]);
    }

    #[test]
    fn test_multibyte_counted_by_char() {
        let chunks = split_text("héé ééé", 3);
        assert_eq!(chunks, vec!["héé", "ééé"]);
    }
}
