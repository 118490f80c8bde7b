//! Property-based tests using proptest

use nextword::*;
use proptest::prelude::*;
use std::collections::HashMap;

const LEN: u32 = 500;

fn entries() -> impl Strategy<Value = Vec<(u32, f64)>> {
    prop::collection::vec((0..LEN, -10.0f64..10.0), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_sparse_reads_match_last_write(writes in entries()) {
        // A plain map is the reference model; the cache in front of the
        // sparse store must never change what a read returns.
        let mut v = SparseVector::new(LEN);
        let mut model: HashMap<u32, f64> = HashMap::new();
        for &(i, value) in &writes {
            v.set(i, value);
            model.insert(i, value);
        }
        for i in 0..LEN {
            let expected = model.get(&i).copied().unwrap_or(0.0);
            prop_assert_eq!(v.get(i), expected);
        }
        prop_assert_eq!(v.count_explicit(), model.len());
    }

    #[test]
    fn test_sparse_remove_restores_zero(writes in entries(), victim in 0..LEN) {
        let mut v = SparseVector::new(LEN);
        for &(i, value) in &writes {
            v.set(i, value);
        }
        v.remove(victim);
        prop_assert_eq!(v.get(victim), 0.0);
        prop_assert!(!v.is_explicit(victim));
    }

    #[test]
    fn test_sparse_sum_matches_model(writes in entries()) {
        let mut v = SparseVector::new(LEN);
        let mut model: HashMap<u32, f64> = HashMap::new();
        for &(i, value) in &writes {
            v.set(i, value);
            model.insert(i, value);
        }
        let expected: f64 = model.values().sum();
        prop_assert!((v.sum() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_dot_is_symmetric(a in entries(), b in entries()) {
        let va = SparseVector::from_entries(LEN, &a);
        let vb = SparseVector::from_entries(LEN, &b);
        prop_assert!((va.dot(&vb) - vb.dot(&va)).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_threshold_idempotent(
        writes in prop::collection::vec((0..LEN, 0.0f64..1.0), 0..40),
        threshold in 0.01f64..1.0
    ) {
        let mut v = SparseVector::from_entries(LEN, &writes);
        v.apply_threshold(threshold);
        let once = v.clone();
        v.apply_threshold(threshold);
        prop_assert_eq!(&v, &once);
        for (_, value) in v.iter() {
            prop_assert_eq!(value, 1.0);
        }
    }

    #[test]
    fn test_add_then_sub_round_trips(a in entries(), b in entries()) {
        let original = SparseVector::from_entries(LEN, &a);
        let vb = SparseVector::from_entries(LEN, &b);
        let mut v = original.clone();
        v += &vb;
        v -= &vb;
        for i in 0..LEN {
            prop_assert!((v.get(i) - original.get(i)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clean_word_idempotent(raw in "\\PC{0,20}") {
        let once = nlp::clean_word(&raw);
        prop_assert_eq!(nlp::clean_word(&once), once.clone());
        prop_assert!(once.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_sigmoid_stays_in_unit_interval(x in -1e6f64..1e6) {
        let p = solver::sigmoid(x);
        prop_assert!((0.0..=1.0).contains(&p));
    }
}
