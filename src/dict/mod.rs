//! Dictionary: vocabulary, training orchestration, and guess ranking
//!
//! The dictionary ingests a word stream, assigns each distinct word an
//! ordinal, and records a sparse precursor vector per occurrence encoding
//! which words preceded it and how closely. Words are drawn into train/test
//! partitions at ingest time. Per-word binary classifiers are fitted against
//! negatives sampled from the training partition, evaluated against the test
//! partition, and persisted one file per word next to the vocabulary index.

pub mod persist;
pub mod word;

pub use word::WordModel;

use crate::config::TrainerConfig;
use crate::errors::{NextwordError, Result};
use crate::nlp;
use crate::solver::{ConfusionMatrix, FitSummary, LogisticSolver};
use crate::vector::{DenseVector, SparseVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use tracing::{debug, warn};

/// Vocabulary and per-word model store
pub struct Dictionary {
    config: TrainerConfig,
    index: BTreeMap<String, u32>,
    models: Vec<WordModel>,
    train: Vec<u32>,
    test: Vec<u32>,
    nix: FxHashSet<String>,
    standard: Vec<String>,
    priority: Option<Vec<u32>>,
    recent: VecDeque<String>,
    rng: StdRng,
}

impl Dictionary {
    /// Create an empty dictionary from a validated configuration
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            index: BTreeMap::new(),
            models: Vec::new(),
            train: Vec::new(),
            test: Vec::new(),
            nix: FxHashSet::default(),
            standard: Vec::new(),
            priority: None,
            recent: VecDeque::new(),
            rng,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Number of distinct words indexed
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no words are indexed
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Whether `word` is indexed
    pub fn exists(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Look up a word's model
    pub fn find(&self, word: &str) -> Option<&WordModel> {
        self.index
            .get(word)
            .map(|&ordinal| &self.models[ordinal as usize])
    }

    /// Look up a model by ordinal
    pub fn by_ordinal(&self, ordinal: u32) -> Option<&WordModel> {
        self.models.get(ordinal as usize)
    }

    /// Iterate every indexed model in sorted text order
    pub fn words(&self) -> impl Iterator<Item = &WordModel> {
        self.index.values().map(|&o| &self.models[o as usize])
    }

    /// Ordinals of the training partition
    pub fn train_partition(&self) -> &[u32] {
        &self.train
    }

    /// Ordinals of the testing partition
    pub fn test_partition(&self) -> &[u32] {
        &self.test
    }

    /// Drop all indexed words, observations, and partitions
    ///
    /// Word lists and the configuration survive.
    pub fn clear(&mut self) {
        self.index.clear();
        self.models.clear();
        self.train.clear();
        self.test.clear();
        self.recent.clear();
        self.priority = None;
    }

    /// Ingest one word occurrence
    ///
    /// A new word is assigned the next ordinal and drawn into a partition; a
    /// known word just bumps its count. Either way the current context window
    /// is encoded as a precursor vector and attached to the word, and the
    /// word joins the window for its successors. Returns whether the word was
    /// newly indexed.
    pub fn add_word(&mut self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        self.priority = None;

        let (ordinal, added) = match self.index.get(word) {
            Some(&ordinal) => {
                self.models[ordinal as usize].increment();
                (ordinal, false)
            }
            None => {
                let ordinal = self.models.len() as u32;
                self.index.insert(word.to_string(), ordinal);
                self.models.push(WordModel::new(word, ordinal, ordinal + 1));
                let r: f64 = self.rng.gen();
                if r < self.config.train_probability {
                    self.train.push(ordinal);
                } else if r < self.config.train_probability + self.config.test_probability {
                    self.test.push(ordinal);
                }
                (ordinal, true)
            }
        };

        let precursor = self.encode_window();
        self.models[ordinal as usize].add_precursor(precursor);

        self.recent.push_back(word.to_string());
        while self.recent.len() > self.config.window_size {
            self.recent.pop_front();
        }
        added
    }

    /// Tokenize raw text and ingest every word
    pub fn add_text(&mut self, text: &str) {
        for token in nlp::tokens(text) {
            self.add_word(&token);
        }
    }

    /// Encode an explicit word sequence as a context vector
    ///
    /// Only the trailing window is considered. The nearest preceding word
    /// gets the highest value (`window_size - 1`), decreasing with distance;
    /// words at or beyond the window edge encode as implicit zero. On a
    /// repeated word the nearest occurrence wins. Unindexed words are
    /// skipped.
    pub fn context_vector(&self, preceding: &[&str]) -> SparseVector {
        let window = self.config.window_size;
        let tail = &preceding[preceding.len().saturating_sub(window)..];
        self.encode(tail.iter().copied(), tail.len())
    }

    fn encode_window(&self) -> SparseVector {
        self.encode(self.recent.iter().map(String::as_str), self.recent.len())
    }

    // `preceding` runs oldest to newest so nearer occurrences overwrite.
    fn encode<'a>(&self, preceding: impl Iterator<Item = &'a str>, n: usize) -> SparseVector {
        let mut v = SparseVector::new(self.models.len() as u32);
        let window = self.config.window_size;
        for (pos, word) in preceding.enumerate() {
            let distance = n - pos;
            let value = window.saturating_sub(distance);
            if value == 0 {
                continue;
            }
            if let Some(&i) = self.index.get(word) {
                v.set(i, value as f64);
            }
        }
        v
    }

    /// Register a standard word: always guessed first, never trained
    pub fn add_standard_word(&mut self, word: impl Into<String>) {
        let word = word.into();
        self.nix.insert(word.clone());
        self.standard.push(word);
        self.priority = None;
    }

    /// Exclude a word from training without making it a standard guess
    pub fn nix_word(&mut self, word: impl Into<String>) {
        self.nix.insert(word.into());
        self.priority = None;
    }

    /// Load standard words from a file, one per line
    ///
    /// Lines are cleaned the same way ingested text is; blank lines are
    /// skipped. Returns the number of words loaded.
    pub fn load_standard_words(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let words = read_word_list(path.as_ref())?;
        let n = words.len();
        for word in words {
            self.add_standard_word(word);
        }
        Ok(n)
    }

    /// Load nixed words from a file, one per line
    pub fn load_nix_words(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let words = read_word_list(path.as_ref())?;
        let n = words.len();
        for word in words {
            self.nix_word(word);
        }
        Ok(n)
    }

    /// Ordinals still waiting for a fitted model, most frequent first
    ///
    /// A word qualifies if it is not nixed and has no model file on disk.
    /// Ties in count break toward lexicographic order. The list is cached
    /// until the next ingest or word-list change.
    pub fn prioritize(&mut self) -> &[u32] {
        if self.priority.is_none() {
            let dir = &self.config.model_dir;
            let mut pending: Vec<u32> = self
                .models
                .iter()
                .filter(|m| !self.nix.contains(m.text()) && !persist::model_exists(dir, m.text()))
                .map(|m| m.ordinal())
                .collect();
            pending.sort_by(|&a, &b| {
                let ma = &self.models[a as usize];
                let mb = &self.models[b as usize];
                mb.count()
                    .cmp(&ma.count())
                    .then_with(|| ma.text().cmp(mb.text()))
            });
            self.priority = Some(pending);
        }
        match &self.priority {
            Some(p) => p,
            None => &[],
        }
    }

    /// Pop the highest-priority untrained word, if any
    ///
    /// The returned word leaves the priority list, so a train-and-persist
    /// loop advances through the vocabulary instead of rescheduling the same
    /// word.
    pub fn get_new(&mut self) -> Option<&WordModel> {
        self.prioritize();
        let ordinal = match &mut self.priority {
            Some(pending) if !pending.is_empty() => pending.remove(0),
            _ => return None,
        };
        self.by_ordinal(ordinal)
    }

    /// Fit the classifier for one word
    ///
    /// Positives are the word's own precursors; negatives are precursors of
    /// other training-partition words, filling the set to ten observations
    /// per positive (capped at 500). The fitted weights replace the model's
    /// in-memory weights.
    pub fn solve(&mut self, word: &str) -> Result<FitSummary> {
        let ordinal = *self
            .index
            .get(word)
            .ok_or_else(|| NextwordError::word_not_found(word))?;
        let mut solver = self.training_solver(ordinal)?;
        let summary = solver.fit();
        debug!(
            word,
            iterations = summary.iterations,
            converged = summary.converged,
            "fit complete"
        );
        if !summary.valid {
            warn!(word, "fit produced non-finite weights");
        }
        self.models[ordinal as usize].set_weights(solver.into_weights());
        Ok(summary)
    }

    /// Fit several words, running the solvers in parallel
    ///
    /// Training sets are assembled and results written back serially; only
    /// the gradient iterations run across threads. The result vector lines
    /// up with `words`.
    pub fn solve_batch(&mut self, words: &[&str]) -> Vec<Result<FitSummary>> {
        let mut results: Vec<Result<FitSummary>> = words
            .iter()
            .map(|w| Err(NextwordError::word_not_found(*w)))
            .collect();

        let mut tasks: Vec<(usize, u32, LogisticSolver)> = Vec::new();
        for (slot, word) in words.iter().enumerate() {
            let Some(&ordinal) = self.index.get(*word) else {
                continue;
            };
            match self.training_solver(ordinal) {
                Ok(solver) => tasks.push((slot, ordinal, solver)),
                Err(e) => results[slot] = Err(e),
            }
        }

        let fitted: Vec<(usize, u32, FitSummary, SparseVector)> = tasks
            .into_par_iter()
            .map(|(slot, ordinal, mut solver)| {
                let summary = solver.fit();
                (slot, ordinal, summary, solver.into_weights())
            })
            .collect();

        for (slot, ordinal, summary, weights) in fitted {
            if !summary.valid {
                warn!(
                    word = self.models[ordinal as usize].text(),
                    "fit produced non-finite weights"
                );
            }
            self.models[ordinal as usize].set_weights(weights);
            results[slot] = Ok(summary);
        }
        results
    }

    /// Evaluate a fitted word against the test partition
    ///
    /// Loads the model from disk if it is not in memory. Predictions are
    /// thresholded at the word's acceptance threshold.
    pub fn test_solution(&mut self, word: &str) -> Result<ConfusionMatrix> {
        let ordinal = *self
            .index
            .get(word)
            .ok_or_else(|| NextwordError::word_not_found(word))?;
        if !self.ensure_populated(ordinal)? {
            return Err(NextwordError::model_not_fitted(word));
        }
        let mut solver = self.evaluation_solver(ordinal)?;
        solver.predict();
        solver.apply_threshold(self.models[ordinal as usize].threshold());
        Ok(solver.confusion())
    }

    /// Sweep the ROC curve on test-partition data and store the winner
    ///
    /// The chosen threshold replaces the word's acceptance threshold and is
    /// returned.
    pub fn find_optimal(&mut self, word: &str) -> Result<f64> {
        let ordinal = *self
            .index
            .get(word)
            .ok_or_else(|| NextwordError::word_not_found(word))?;
        if !self.ensure_populated(ordinal)? {
            return Err(NextwordError::model_not_fitted(word));
        }
        let mut solver = self.evaluation_solver(ordinal)?;
        let point = solver.find_optimal_threshold();
        debug!(
            word,
            threshold = point.threshold,
            tpr = point.true_positive_rate,
            fpr = point.false_positive_rate,
            "threshold sweep"
        );
        self.models[ordinal as usize].set_threshold(point.threshold);
        Ok(point.threshold)
    }

    /// Probability that `word` follows the given context
    ///
    /// Unindexed or unfitted words score 0.0; a model file is loaded lazily
    /// if one exists. Load failures are logged and score 0.0 rather than
    /// erroring, since this sits on the interactive path.
    pub fn find_prob(&mut self, word: &str, context: &SparseVector) -> f64 {
        let Some(&ordinal) = self.index.get(word) else {
            return 0.0;
        };
        match self.ensure_populated(ordinal) {
            Ok(true) => self.models[ordinal as usize].find_prob(context),
            Ok(false) => 0.0,
            Err(e) => {
                warn!(word, error = %e, "failed to load model");
                0.0
            }
        }
    }

    /// Rank guesses for the next word after the given context
    ///
    /// Standard words lead the list in registration order; the remaining
    /// slots go to indexed words whose fitted probability clears the
    /// acceptance cutoff, best first (ordinal breaks ties). The combined
    /// list is capped at `max_guesses`. Returns ordinals.
    pub fn get_guesses(&mut self, context: &SparseVector) -> Vec<u32> {
        for ordinal in 0..self.models.len() as u32 {
            if let Err(e) = self.ensure_populated(ordinal) {
                warn!(
                    word = self.models[ordinal as usize].text(),
                    error = %e,
                    "failed to load model"
                );
            }
        }

        let accept = self.config.accept_probability;
        let standard_set: FxHashSet<&str> = self.standard.iter().map(String::as_str).collect();
        let mut scored: Vec<(u32, f64)> = self
            .models
            .par_iter()
            .filter(|m| !standard_set.contains(m.text()))
            .map(|m| (m.ordinal(), m.find_prob(context)))
            .filter(|&(_, p)| p > accept)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let mut guesses: Vec<u32> = self
            .standard
            .iter()
            .filter_map(|w| self.index.get(w).copied())
            .collect();
        guesses.extend(scored.into_iter().map(|(ordinal, _)| ordinal));
        guesses.truncate(self.config.max_guesses);
        guesses
    }

    /// Persist the vocabulary index and every in-memory fitted model
    ///
    /// Newly written model files retire their words from the priority list.
    pub fn write(&mut self) -> Result<()> {
        let dir = &self.config.model_dir;
        persist::write_index(dir, self.index.iter().map(|(w, &o)| (w.as_str(), o)))?;
        for model in &self.models {
            if model.is_populated() {
                persist::write_model(dir, model.text(), model.weights(), model.threshold())?;
            }
        }
        self.priority = None;
        Ok(())
    }

    /// Persist one word's fitted model and retire it from the priority list
    pub fn write_model(&mut self, word: &str) -> Result<()> {
        let model = self
            .find(word)
            .ok_or_else(|| NextwordError::word_not_found(word))?;
        if !model.is_populated() {
            return Err(NextwordError::model_not_fitted(word));
        }
        persist::write_model(
            &self.config.model_dir,
            model.text(),
            model.weights(),
            model.threshold(),
        )?;
        self.priority = None;
        Ok(())
    }

    /// Replace the dictionary contents with the persisted index
    ///
    /// Counts, observations, and partitions are not persisted; the reloaded
    /// dictionary serves lookups and guessing, not further training. Model
    /// weights load lazily on first use.
    pub fn read(&mut self) -> Result<()> {
        let entries = persist::read_index(&self.config.model_dir)?;
        let n = entries.len();

        let mut models: Vec<Option<WordModel>> = (0..n).map(|_| None).collect();
        let mut index = BTreeMap::new();
        for (word, ordinal) in entries {
            let slot = models.get_mut(ordinal as usize).ok_or_else(|| {
                NextwordError::corrupt_file(
                    persist::index_path(&self.config.model_dir).display().to_string(),
                    format!("ordinal {ordinal} out of range for {n} entries"),
                )
            })?;
            if slot.is_some() || index.contains_key(&word) {
                return Err(NextwordError::corrupt_file(
                    persist::index_path(&self.config.model_dir).display().to_string(),
                    format!("duplicate entry for ordinal {ordinal}"),
                ));
            }
            *slot = Some(WordModel::new(word.clone(), ordinal, n as u32));
            index.insert(word, ordinal);
        }

        self.clear();
        self.index = index;
        self.models = models.into_iter().flatten().collect();
        debug!(words = self.models.len(), "index loaded");
        Ok(())
    }

    /// Make sure a word's weights are in memory, loading from disk if needed
    ///
    /// `Ok(false)` means no fitted model exists anywhere for the word.
    fn ensure_populated(&mut self, ordinal: u32) -> Result<bool> {
        if self.models[ordinal as usize].is_populated() {
            return Ok(true);
        }
        let dir = &self.config.model_dir;
        let word = self.models[ordinal as usize].text().to_string();
        if !persist::model_exists(dir, &word) {
            return Ok(false);
        }
        let (mut weights, threshold) = persist::read_model(dir, &word)?;
        weights.upsize(self.models.len() as u32);
        let model = &mut self.models[ordinal as usize];
        model.set_weights(weights);
        model.set_threshold(threshold);
        Ok(true)
    }

    fn training_solver(&self, ordinal: u32) -> Result<LogisticSolver> {
        let (features, labels) = self.assemble(ordinal, &self.train)?;
        let model = &self.models[ordinal as usize];
        let weights = model.initial_weights(self.config.initial_weight, self.models.len() as u32);
        Ok(LogisticSolver::new(weights, features, labels)
            .with_learning_rate(self.config.learning_rate)
            .with_epsilon(self.config.epsilon)
            .with_max_iterations(self.config.max_iterations))
    }

    fn evaluation_solver(&self, ordinal: u32) -> Result<LogisticSolver> {
        let (features, labels) = self.assemble(ordinal, &self.test)?;
        let weights = self.models[ordinal as usize].weights().clone();
        Ok(LogisticSolver::new(weights, features, labels))
    }

    /// Assemble a labeled example set: the word's own precursors as
    /// positives, precursors of other partition words as negatives, up to
    /// the word's observation budget.
    fn assemble(&self, ordinal: u32, partition: &[u32]) -> Result<(Vec<SparseVector>, DenseVector)> {
        let model = &self.models[ordinal as usize];
        let budget = model.num_observations();
        if budget == 0 {
            return Err(NextwordError::no_training_data(model.text()));
        }
        let dim = self.models.len() as u32;

        let mut features = model.positive_examples(dim);
        let mut labels = vec![1.0; features.len()];

        'outer: for &other in partition {
            if other == ordinal {
                continue;
            }
            for precursor in self.models[other as usize].precursors() {
                if features.len() >= budget {
                    break 'outer;
                }
                let mut x = precursor.clone();
                x.upsize(dim);
                features.push(x);
                labels.push(0.0);
            }
        }
        Ok((features, DenseVector::from_vec(labels)))
    }
}

fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(nlp::clean_word)
        .filter(|w| !w.is_empty())
        .collect())
}
