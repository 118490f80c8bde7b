//! Batch logistic-regression solver
//!
//! Gradient ascent on the log-likelihood of a binary outcome over sparse
//! feature vectors, with a fixed learning rate. The solver also carries the
//! evaluation half of the pipeline: fitted probabilities, thresholded
//! predictions, confusion tallies, and the brute-force ROC sweep that picks
//! an operating threshold.
//!
//! The log-likelihood accumulator is reset at the start of every iteration,
//! so the convergence check compares consecutive per-iteration likelihoods.

use crate::vector::{DenseVector, SparseVector};

/// Fixed gradient-ascent step size
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Default convergence threshold on the log-likelihood delta
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// ROC sweep: 50 thresholds stepped evenly across (0, 1)
const ROC_STEPS: usize = 50;
const ROC_STEP: f64 = 0.01998;

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// ln(1 + e^x), guarded against overflow for large x
fn log1p_exp(x: f64) -> f64 {
    if x > 30.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Where the solver currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No fit has been run
    Idle,
    /// The last fit converged within the iteration cap
    Converged,
    /// The last fit stopped at the iteration cap
    MaxIterationsReached,
}

/// Outcome of a single `fit` call
#[derive(Debug, Clone, Copy)]
pub struct FitSummary {
    /// Iterations actually used (diagnostic for time-estimate calibration)
    pub iterations: usize,
    /// Whether the likelihood delta dropped below epsilon
    pub converged: bool,
    /// Whether every fitted weight is a finite number
    pub valid: bool,
}

/// Confusion tally for thresholded binary predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against observed labels
    ///
    /// Both vectors must already be 0/1 indicators of equal length;
    /// mismatched lengths yield an empty tally.
    pub fn tally(predictions: &DenseVector, labels: &DenseVector) -> Self {
        let mut conf = Self::default();
        if predictions.len() != labels.len() {
            return conf;
        }
        for (p, y) in predictions.iter().zip(labels.iter()) {
            match (p == 1.0, y == 1.0) {
                (true, true) => conf.true_positives += 1,
                (true, false) => conf.false_positives += 1,
                (false, true) => conf.false_negatives += 1,
                (false, false) => conf.true_negatives += 1,
            }
        }
        conf
    }

    /// TP / (TP + FN), or 0.0 with no positive labels
    pub fn true_positive_rate(&self) -> f64 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f64 / denom as f64
    }

    /// FP / (FP + TN), or 0.0 with no negative labels
    pub fn false_positive_rate(&self) -> f64 {
        let denom = self.false_positives + self.true_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.false_positives as f64 / denom as f64
    }

    /// Total examples tallied
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// A point on the ROC curve chosen by the threshold sweep
#[derive(Debug, Clone, Copy)]
pub struct OperatingPoint {
    pub threshold: f64,
    pub true_positive_rate: f64,
    pub false_positive_rate: f64,
    /// Squared Euclidean distance to the ideal point (FPR 0, TPR 1)
    pub distance: f64,
}

/// Batch gradient-ascent logistic-regression solver
#[derive(Debug, Clone)]
pub struct LogisticSolver {
    weights: SparseVector,
    features: Vec<SparseVector>,
    labels: DenseVector,
    results: DenseVector,
    predictions: DenseVector,
    learning_rate: f64,
    epsilon: f64,
    max_iterations: usize,
    state: SolverState,
}

impl LogisticSolver {
    /// Create a solver over a prepared training set
    ///
    /// `weights` and every feature vector are expected to share a nominal
    /// length; `labels` must have one 0/1 entry per feature vector.
    pub fn new(weights: SparseVector, features: Vec<SparseVector>, labels: DenseVector) -> Self {
        Self {
            weights,
            features,
            labels,
            results: DenseVector::default(),
            predictions: DenseVector::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            state: SolverState::Idle,
        }
    }

    /// Builder method: set the learning rate
    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.learning_rate = alpha;
        self
    }

    /// Builder method: set the convergence epsilon
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builder method: set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Number of training examples
    pub fn examples(&self) -> usize {
        self.labels.len()
    }

    /// Current weights
    pub fn weights(&self) -> &SparseVector {
        &self.weights
    }

    /// Consume the solver, yielding the fitted weights
    pub fn into_weights(self) -> SparseVector {
        self.weights
    }

    /// Fitted probabilities from the last `predict`
    pub fn results(&self) -> &DenseVector {
        &self.results
    }

    /// Thresholded 0/1 predictions from the last `apply_threshold`
    pub fn predictions(&self) -> &DenseVector {
        &self.predictions
    }

    /// Current solver state
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Whether every current weight is a finite number
    pub fn is_valid(&self) -> bool {
        self.weights.is_valid()
    }

    /// Iterate to a solution
    ///
    /// Each iteration accumulates the gradient `g += x * (y - sigmoid(w.x))`
    /// and the per-iteration log-likelihood over all examples, then either
    /// stops (likelihood delta below epsilon) or steps the weights by
    /// `g * learning_rate`.
    pub fn fit(&mut self) -> FitSummary {
        let dim = self.weights.len();
        let mut ll_prev = 0.0;

        for iteration in 1..=self.max_iterations {
            let mut gradient = SparseVector::new(dim);
            let mut ll = 0.0;

            for (x, y) in self.features.iter().zip(self.labels.iter()) {
                let wtx = self.weights.dot(x);
                let p = sigmoid(wtx);
                gradient.scaled_add(x, y - p);
                ll += y * wtx - log1p_exp(wtx);
            }

            if iteration > 1 && (ll - ll_prev).abs() < self.epsilon {
                self.state = SolverState::Converged;
                return FitSummary {
                    iterations: iteration,
                    converged: true,
                    valid: self.is_valid(),
                };
            }
            ll_prev = ll;
            self.weights.scaled_add(&gradient, self.learning_rate);
        }

        self.state = SolverState::MaxIterationsReached;
        FitSummary {
            iterations: self.max_iterations,
            converged: false,
            valid: self.is_valid(),
        }
    }

    /// Compute the fitted probability for every example
    ///
    /// Invalidates any previous thresholded predictions.
    pub fn predict(&mut self) {
        self.predictions.resize(0);
        self.results.resize(self.examples());
        for (i, x) in self.features.iter().enumerate() {
            self.results[i] = sigmoid(self.weights.dot(x));
        }
    }

    /// Threshold the fitted probabilities into 0/1 predictions
    pub fn apply_threshold(&mut self, threshold: f64) {
        self.predictions = self.results.clone();
        self.predictions.apply_threshold(threshold);
    }

    /// Tally the current predictions against the observed labels
    pub fn confusion(&self) -> ConfusionMatrix {
        ConfusionMatrix::tally(&self.predictions, &self.labels)
    }

    /// Brute-force ROC sweep for the operating threshold
    ///
    /// Tries 50 thresholds stepped by 0.01998 across (0, 1) and keeps the one
    /// whose (FPR, TPR) point lies closest to the ideal corner. Falls back to
    /// 0.5 if no step produces a finite improvement.
    pub fn find_optimal_threshold(&mut self) -> OperatingPoint {
        if self.results.len() != self.examples() {
            self.predict();
        }

        let mut best = OperatingPoint {
            threshold: 0.5,
            true_positive_rate: 0.0,
            false_positive_rate: 0.0,
            distance: f64::INFINITY,
        };

        let mut threshold = 0.0;
        for _ in 0..ROC_STEPS {
            threshold += ROC_STEP;
            let mut predictions = self.results.clone();
            predictions.apply_threshold(threshold);
            let conf = ConfusionMatrix::tally(&predictions, &self.labels);
            let tpr = conf.true_positive_rate();
            let fpr = conf.false_positive_rate();
            let distance = (tpr - 1.0) * (tpr - 1.0) + fpr * fpr;
            if distance < best.distance {
                best = OperatingPoint {
                    threshold,
                    true_positive_rate: tpr,
                    false_positive_rate: fpr,
                    distance,
                };
            }
        }
        best
    }
}
