//! Word cleaning and tokenization
//!
//! The dictionary indexes cleaned words only: ASCII letters, lowercased.
//! Everything else (digits, punctuation, accents, emoji) is dropped, so
//! "Don't" and "dont" land on the same ordinal and every indexed word is a
//! safe model file name.

use unicode_segmentation::UnicodeSegmentation;

/// Reduce a raw token to its indexed form
///
/// Keeps ASCII letters lowercased and discards every other character. May
/// return an empty string, which callers skip.
pub fn clean_word(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split raw text into cleaned, non-empty words in order
pub fn tokens(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(clean_word)
        .filter(|w| !w.is_empty())
        .collect()
}
