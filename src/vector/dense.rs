//! Dense companion vector
//!
//! Used where sparsity does not help: label vectors, fitted-probability and
//! thresholded-prediction vectors. Every position is materialized.

use std::ops::{Index, IndexMut};

/// A fixed-size dense vector of `f64`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseVector {
    a: Vec<f64>,
}

impl DenseVector {
    /// Create a zero-filled vector of length `len`
    pub fn new(len: usize) -> Self {
        Self { a: vec![0.0; len] }
    }

    /// Wrap an existing buffer
    pub fn from_vec(a: Vec<f64>) -> Self {
        Self { a }
    }

    /// Length of the vector
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether the vector has zero length
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Read the value at `i`
    pub fn get(&self, i: usize) -> f64 {
        self.a[i]
    }

    /// Set the value at `i`
    pub fn set(&mut self, i: usize, value: f64) {
        self.a[i] = value;
    }

    /// Set every position to `value`
    pub fn fill(&mut self, value: f64) {
        self.a.fill(value);
    }

    /// Discard all data and zero-fill to a new length
    pub fn resize(&mut self, len: usize) {
        self.a.clear();
        self.a.resize(len, 0.0);
    }

    /// Sum of all positions
    pub fn sum(&self) -> f64 {
        self.a.iter().sum()
    }

    /// Set positions at or above `f` to 1.0 and the rest to 0.0
    pub fn apply_threshold(&mut self, f: f64) {
        for v in &mut self.a {
            *v = if *v >= f { 1.0 } else { 0.0 };
        }
    }

    /// Iterate over values
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.a.iter().copied()
    }

    /// View the underlying buffer
    pub fn as_slice(&self) -> &[f64] {
        &self.a
    }
}

impl Index<usize> for DenseVector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.a[i]
    }
}

impl IndexMut<usize> for DenseVector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.a[i]
    }
}
