//! Integration tests for nextword

use nextword::*;
use tempfile::TempDir;

/// Sample text for testing
const SAMPLE_TEXT: &str = r#"
The quick brown fox jumps over the lazy dog. The quick brown fox is a
well-known pangram subject, and the lazy dog never seems to mind. When the
fox jumps again, the dog watches the fox and the fox watches the dog.

A dictionary of words can learn which words tend to follow other words. The
more often a word follows the same few words, the easier that word is to
predict. Common words like the and a appear everywhere, so they make poor
evidence on their own.
"#;

fn training_config(dir: &TempDir) -> TrainerConfig {
    TrainerConfig::default()
        .with_partitions(0.6, 0.4)
        .with_seed(42)
        .with_model_dir(dir.path())
}

#[test]
fn test_ingest_cleans_and_indexes() {
    let dir = TempDir::new().unwrap();
    let mut dict = Dictionary::new(training_config(&dir)).unwrap();
    dict.add_text(SAMPLE_TEXT);

    assert!(!dict.is_empty());
    assert!(dict.exists("fox"));
    assert!(dict.exists("dictionary"));
    // punctuation and case are stripped before indexing
    assert!(dict.exists("pangram"));
    assert!(dict.exists("well"));
    assert!(dict.exists("known"));
    assert!(!dict.exists("The"));
    assert!(!dict.exists("dog."));

    // "the" dominates the sample
    let the = dict.find("the").unwrap();
    assert!(the.count() > dict.find("fox").unwrap().count());

    // ordinal lookups agree with name lookups
    for model in dict.words() {
        assert_eq!(
            dict.by_ordinal(model.ordinal()).unwrap().text(),
            model.text()
        );
    }
}

#[test]
fn test_window_encoding_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut dict = Dictionary::new(training_config(&dir)).unwrap();
    dict.add_text("The quick brown fox, the quick brown dog!");

    // fox and dog are both preceded by "the quick brown" within the window
    let ctx = dict.context_vector(&["the", "quick", "brown"]);
    assert_eq!(dict.find("fox").unwrap().precursors()[0], ctx);
    assert_eq!(dict.find("dog").unwrap().precursors()[0], ctx);

    // nearest precursor carries the highest value
    let brown = dict.find("brown").unwrap().ordinal();
    let the = dict.find("the").unwrap().ordinal();
    assert!(ctx.get(brown) > ctx.get(the));
}

#[test]
fn test_train_evaluate_and_guess() {
    let dir = TempDir::new().unwrap();
    let mut dict = Dictionary::new(training_config(&dir)).unwrap();
    for _ in 0..20 {
        dict.add_text(SAMPLE_TEXT);
    }

    // train the highest-priority word
    let word = dict.get_new().unwrap().text().to_string();
    let summary = dict.solve(&word).unwrap();
    assert!(summary.valid);
    assert!(summary.iterations > 0);
    assert!(dict.find(&word).unwrap().is_populated());

    // evaluation runs against the test partition
    let conf = dict.test_solution(&word).unwrap();
    assert!(conf.total() > 0);

    let threshold = dict.find_optimal(&word).unwrap();
    assert!(threshold > 0.0 && threshold < 1.0);
    assert_eq!(dict.find(&word).unwrap().threshold(), threshold);

    // guessing stays within bounds and only offers indexed words
    dict.add_standard_word("the");
    let ctx = dict.context_vector(&["the", "quick", "brown"]);
    let guesses = dict.get_guesses(&ctx);
    assert!(guesses.len() <= dict.config().max_guesses);
    assert_eq!(guesses[0], dict.find("the").unwrap().ordinal());
    for ordinal in &guesses {
        assert!(dict.by_ordinal(*ordinal).is_some());
    }
}

#[test]
fn test_batch_solve_matches_inputs() {
    let dir = TempDir::new().unwrap();
    let config = TrainerConfig::default()
        .with_partitions(1.0, 0.0)
        .with_seed(7)
        .with_model_dir(dir.path());
    let mut dict = Dictionary::new(config).unwrap();
    for _ in 0..10 {
        dict.add_text(SAMPLE_TEXT);
    }

    let results = dict.solve_batch(&["fox", "dog", "notaword"]);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(NextwordError::WordNotFound { .. })));
}

#[test]
fn test_persistence_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = TrainerConfig::default()
        .with_partitions(1.0, 0.0)
        .with_seed(11)
        .with_model_dir(dir.path());
    let mut dict = Dictionary::new(config.clone()).unwrap();
    for _ in 0..10 {
        dict.add_text(SAMPLE_TEXT);
    }
    dict.solve("fox").unwrap();
    dict.write().unwrap();

    let mut reloaded = Dictionary::new(config).unwrap();
    reloaded.read().unwrap();
    assert_eq!(reloaded.len(), dict.len());
    assert_eq!(
        reloaded.find("fox").unwrap().ordinal(),
        dict.find("fox").unwrap().ordinal()
    );

    // probabilities come back from the model file on demand
    let ctx = reloaded.context_vector(&["the", "quick", "brown"]);
    assert!(reloaded.find_prob("fox", &ctx) > 0.0);

    // observations are not persisted, so retraining needs fresh ingest
    let err = reloaded.solve("fox").unwrap_err();
    assert!(matches!(err, NextwordError::NoTrainingData { .. }));
}

#[test]
fn test_same_seed_reproduces_partitions() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let mut a = Dictionary::new(training_config(&dir_a)).unwrap();
    let mut b = Dictionary::new(training_config(&dir_b)).unwrap();
    a.add_text(SAMPLE_TEXT);
    b.add_text(SAMPLE_TEXT);
    assert_eq!(a.train_partition(), b.train_partition());
    assert_eq!(a.test_partition(), b.test_partition());
}
