//! Text ingestion helpers

pub mod cleaner;

pub use cleaner::{clean_word, tokens};
