//! # nextword
//!
//! A next-word suggestion engine built from per-word logistic regression.
//!
//! This library ingests a word stream, encodes each word's recent context as
//! a sparse precursor vector, and fits one binary classifier per word that
//! answers "does this word come next?". Fitted models are persisted one file
//! per word and loaded lazily at guess time.
//!
//! ## Features
//!
//! - **Sparse**: context vectors and model weights store only non-zero
//!   entries, fronted by a direct-mapped read cache
//! - **Incremental**: words are trained independently and on demand, most
//!   frequent first
//! - **Parallel**: batch fitting and guess scoring run across threads
//! - **Durable**: compact little-endian index and model files

pub mod config;
pub mod dict;
pub mod errors;
pub mod nlp;
pub mod solver;
pub mod vector;

// Re-export commonly used types
pub use config::TrainerConfig;
pub use dict::{Dictionary, WordModel};
pub use errors::{NextwordError, Result};
pub use solver::{ConfusionMatrix, FitSummary, LogisticSolver, OperatingPoint, SolverState};
pub use vector::{DenseVector, SparseVector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
