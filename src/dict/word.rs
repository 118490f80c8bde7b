//! Per-word model state
//!
//! Each indexed word carries its occurrence count, the precursor vectors
//! observed for it, and (once trained) a sparse weight vector plus an
//! acceptance threshold. The weight vector is the only part persisted per
//! word; precursors and counts live only for the lifetime of a training run.

use crate::solver::sigmoid;
use crate::vector::SparseVector;

/// Positive examples per precursor when sizing a training set
const OBSERVATIONS_PER_PRECURSOR: usize = 10;

/// Hard cap on the training-set size for a single word
const MAX_OBSERVATIONS: usize = 500;

/// Default acceptance threshold before any ROC sweep has run
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// A single word's training state and fitted model
#[derive(Debug, Clone)]
pub struct WordModel {
    text: String,
    ordinal: u32,
    count: u64,
    precursors: Vec<SparseVector>,
    weights: SparseVector,
    threshold: f64,
    populated: bool,
}

impl WordModel {
    /// Create the model for a word first seen at `ordinal`
    pub fn new(text: impl Into<String>, ordinal: u32, vocab_len: u32) -> Self {
        Self {
            text: text.into(),
            ordinal,
            count: 1,
            precursors: Vec::new(),
            weights: SparseVector::new(vocab_len),
            threshold: DEFAULT_THRESHOLD,
            populated: false,
        }
    }

    /// The word itself
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of the word in the vocabulary
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Number of occurrences observed
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Record one more occurrence
    pub fn increment(&mut self) {
        self.count += 1;
    }

    /// Precursor vectors observed so far
    pub fn precursors(&self) -> &[SparseVector] {
        &self.precursors
    }

    /// Attach the context vector of one occurrence
    pub fn add_precursor(&mut self, precursor: SparseVector) {
        self.precursors.push(precursor);
    }

    /// Acceptance threshold for guess ranking
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Override the acceptance threshold
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Whether a fitted weight vector is held in memory
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Fitted weights (meaningful only when populated)
    pub fn weights(&self) -> &SparseVector {
        &self.weights
    }

    /// Install a fitted weight vector
    pub fn set_weights(&mut self, weights: SparseVector) {
        self.weights = weights;
        self.populated = true;
    }

    /// Total training-set size for this word
    ///
    /// Ten observations per recorded precursor, capped at 500. Positives fill
    /// the front of the set; the balance is negatives drawn from other words.
    pub fn num_observations(&self) -> usize {
        (OBSERVATIONS_PER_PRECURSOR * self.precursors.len()).min(MAX_OBSERVATIONS)
    }

    /// Fresh weight vector covering every index any precursor mentions
    ///
    /// Each mentioned index gets an explicit `initial` entry; everything else
    /// stays implicit zero and is never updated by the gradient.
    pub fn initial_weights(&self, initial: f64, vocab_len: u32) -> SparseVector {
        let mut weights = SparseVector::new(vocab_len);
        for precursor in &self.precursors {
            for (i, _) in precursor.iter() {
                weights.set(i, initial);
            }
        }
        weights
    }

    /// Positive training examples, upsized to the current vocabulary
    ///
    /// At most `num_observations` precursors are used, so a word with many
    /// occurrences trains on its earliest 500.
    pub fn positive_examples(&self, vocab_len: u32) -> Vec<SparseVector> {
        self.precursors
            .iter()
            .take(self.num_observations())
            .map(|p| {
                let mut x = p.clone();
                x.upsize(vocab_len);
                x
            })
            .collect()
    }

    /// Probability that this word follows the given context
    ///
    /// An unpopulated model scores 0.0 rather than guessing.
    pub fn find_prob(&self, context: &SparseVector) -> f64 {
        if !self.populated {
            return 0.0;
        }
        sigmoid(self.weights.dot(context))
    }
}
