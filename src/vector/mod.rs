//! Vector containers
//!
//! `SparseVector` is the workhorse for context encodings and model weights;
//! `DenseVector` covers label and result vectors where most positions are
//! non-zero anyway.

pub mod dense;
pub mod sparse;

pub use dense::DenseVector;
pub use sparse::{SparseVector, CACHE_SLOTS};
