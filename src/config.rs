//! Trainer configuration
//!
//! All tunable constants live here: the context-window size, the train/test
//! partition probabilities, the gradient-ascent parameters, the guess-ranking
//! limits, the persistence base directory, and the RNG seed. The defaults
//! suit interactive training on prose corpora: a window of 4, epsilon 0.01,
//! at most 1000 iterations, learning rate 0.001, acceptance probability 0.5,
//! and up to 256 guesses.

use crate::errors::{NextwordError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_model_dir() -> PathBuf {
    PathBuf::from("dict")
}

/// Configuration for dictionary construction and model training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of preceding words encoded into each precursor vector
    pub window_size: usize,
    /// Probability that a newly indexed word joins the training partition
    pub train_probability: f64,
    /// Probability that a newly indexed word joins the testing partition
    pub test_probability: f64,
    /// Value written into every explicit weight slot before fitting
    pub initial_weight: f64,
    /// Fixed gradient-ascent step size
    pub learning_rate: f64,
    /// Convergence threshold on the per-iteration log-likelihood delta
    pub epsilon: f64,
    /// Iteration cap for a single fit
    pub max_iterations: usize,
    /// Probability cutoff above which a word is offered as a guess
    pub accept_probability: f64,
    /// Hard cap on the combined guess list
    pub max_guesses: usize,
    /// Directory holding the index file and per-word model files
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    /// Seed for the partition-assignment RNG
    #[serde(default)]
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            window_size: 4,
            train_probability: 0.2,
            test_probability: 0.1,
            initial_weight: 1.0,
            learning_rate: 0.001,
            epsilon: 0.01,
            max_iterations: 1000,
            accept_probability: 0.5,
            max_guesses: 256,
            model_dir: default_model_dir(),
            seed: 0,
        }
    }
}

impl TrainerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(NextwordError::invalid_config("window_size must be > 0"));
        }

        if !(0.0..=1.0).contains(&self.train_probability)
            || !(0.0..=1.0).contains(&self.test_probability)
        {
            return Err(NextwordError::invalid_config(
                "partition probabilities must be between 0 and 1",
            ));
        }

        if self.train_probability + self.test_probability > 1.0 {
            return Err(NextwordError::invalid_config(format!(
                "train_probability + test_probability must not exceed 1, got {}",
                self.train_probability + self.test_probability
            )));
        }

        if self.learning_rate <= 0.0 {
            return Err(NextwordError::invalid_config("learning_rate must be > 0"));
        }

        if self.epsilon <= 0.0 {
            return Err(NextwordError::invalid_config("epsilon must be > 0"));
        }

        if self.max_iterations == 0 {
            return Err(NextwordError::invalid_config("max_iterations must be > 0"));
        }

        if !(0.0 < self.accept_probability && self.accept_probability < 1.0) {
            return Err(NextwordError::invalid_config(format!(
                "accept_probability must be in (0, 1), got {}",
                self.accept_probability
            )));
        }

        if self.max_guesses == 0 {
            return Err(NextwordError::invalid_config("max_guesses must be > 0"));
        }

        Ok(())
    }

    /// Builder method: set the context-window size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Builder method: set the partition probabilities
    pub fn with_partitions(mut self, train: f64, test: f64) -> Self {
        self.train_probability = train;
        self.test_probability = test;
        self
    }

    /// Builder method: set the initial weight value
    pub fn with_initial_weight(mut self, w: f64) -> Self {
        self.initial_weight = w;
        self
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

    /// Builder method: set the guess acceptance probability
    pub fn with_accept_probability(mut self, p: f64) -> Self {
        self.accept_probability = p;
        self
    }

    /// Builder method: set the guess-list cap
    pub fn with_max_guesses(mut self, max_guesses: usize) -> Self {
        self.max_guesses = max_guesses;
        self
    }

    /// Builder method: set the persistence directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Builder method: set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
