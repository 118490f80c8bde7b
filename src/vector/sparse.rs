//! Sparse numeric vector with a direct-mapped read cache
//!
//! `SparseVector` maps a small set of explicit `(index, value)` entries over a
//! fixed nominal length; absent indices are implicit zeros. The backing store
//! is an ordered map (O(log k) lookup over k explicit entries) fronted by a
//! 64-slot direct-mapped cache keyed on `index % 64`. The cache holds value
//! *copies*, never references into the store: every mutation path either
//! writes through or invalidates the affected slot, and the store is always
//! the source of truth.
//!
//! Arithmetic between two vectors requires equal nominal lengths; a mismatch
//! is a silent no-op rather than an error. This is a deliberately weak
//! contract kept for compatibility with the evaluation pipeline built on it.

use std::collections::BTreeMap;
use std::ops::{AddAssign, MulAssign, SubAssign};

/// Number of direct-mapped cache slots
pub const CACHE_SLOTS: usize = 64;

/// Results of `exp_elem` smaller than this are pruned back to implicit zero
const EXP_PRUNE_EPS: f64 = 1e-5;

/// Slot tag marking an unoccupied cache line
const VACANT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct CacheSlot {
    tag: u32,
    value: f64,
}

impl CacheSlot {
    const fn vacant() -> Self {
        Self {
            tag: VACANT,
            value: 0.0,
        }
    }
}

/// A sparse vector of `f64` with fixed nominal length
#[derive(Clone)]
pub struct SparseVector {
    entries: BTreeMap<u32, f64>,
    cache: [CacheSlot; CACHE_SLOTS],
    len: u32,
}

impl SparseVector {
    /// Create a vector of nominal length `len` with no explicit entries
    pub fn new(len: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            cache: [CacheSlot::vacant(); CACHE_SLOTS],
            len,
        }
    }

    /// Build a vector from explicit `(index, value)` pairs
    ///
    /// Indices must be within `len`; later duplicates overwrite earlier ones.
    pub fn from_entries(len: u32, pairs: &[(u32, f64)]) -> Self {
        let mut v = Self::new(len);
        for &(i, value) in pairs {
            v.set(i, value);
        }
        v
    }

    /// Nominal length of the vector
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the nominal length is zero
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of explicit entries
    pub fn count_explicit(&self) -> usize {
        self.entries.len()
    }

    /// Whether index `i` has an explicit entry
    pub fn is_explicit(&self, i: u32) -> bool {
        let slot = &self.cache[Self::slot_of(i)];
        if slot.tag == i {
            return true;
        }
        self.entries.contains_key(&i)
    }

    /// Discard all data and set a new nominal length
    pub fn resize(&mut self, len: u32) {
        self.entries.clear();
        self.cache_clear();
        self.len = len;
    }

    /// Grow the nominal length without touching existing entries
    ///
    /// Returns `false` (and does nothing) if `len` is not larger than the
    /// current length. New positions are de-facto zeros.
    pub fn upsize(&mut self, len: u32) -> bool {
        if len <= self.len {
            return false;
        }
        self.len = len;
        true
    }

    /// Read the value at index `i`
    ///
    /// O(1) on a cache-tag hit, otherwise an ordered lookup. Implicit entries
    /// read as 0.0. Panics if `i` is outside the nominal length.
    pub fn get(&self, i: u32) -> f64 {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        let slot = &self.cache[Self::slot_of(i)];
        if slot.tag == i {
            return slot.value;
        }
        self.entries.get(&i).copied().unwrap_or(0.0)
    }

    /// Read the value at index `i`, materializing an explicit 0.0 on a miss
    ///
    /// The entry (new or found) is installed into its cache slot, evicting
    /// whatever was tagged there. Panics if `i` is outside the nominal length.
    pub fn get_or_insert(&mut self, i: u32) -> f64 {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        let slot = Self::slot_of(i);
        if self.cache[slot].tag == i {
            return self.cache[slot].value;
        }
        let value = *self.entries.entry(i).or_insert(0.0);
        self.cache[slot] = CacheSlot { tag: i, value };
        value
    }

    /// Set index `i` to `value`
    ///
    /// An explicit zero written here is allowed to linger; only `remove`,
    /// thresholding, and exponential pruning drop entries. Panics if `i` is
    /// outside the nominal length.
    pub fn set(&mut self, i: u32, value: f64) {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        self.entries.insert(i, value);
        self.cache[Self::slot_of(i)] = CacheSlot { tag: i, value };
    }

    /// Remove the explicit entry at `i`, if present
    ///
    /// Future reads return 0.0. The cache slot is invalidated only when it
    /// was tagged for `i`.
    pub fn remove(&mut self, i: u32) {
        assert!(i < self.len, "index {i} out of range for length {}", self.len);
        self.entries.remove(&i);
        self.cache_invalidate(i);
    }

    /// Overwrite every explicit entry with `value`
    pub fn set_explicit(&mut self, value: f64) {
        for v in self.entries.values_mut() {
            *v = value;
        }
        for slot in &mut self.cache {
            if slot.tag != VACANT {
                slot.value = value;
            }
        }
    }

    /// Sum of all explicit entries
    pub fn sum(&self) -> f64 {
        self.entries.values().sum()
    }

    /// Dot product over explicit entries
    ///
    /// Iterates the smaller explicit set; implicit zeros contribute nothing,
    /// so the nominal lengths of the operands need not match.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.entries.len() <= other.entries.len() {
            (&self.entries, &other.entries)
        } else {
            (&other.entries, &self.entries)
        };
        small
            .iter()
            .filter_map(|(i, v)| large.get(i).map(|w| v * w))
            .sum()
    }

    /// Accumulate `other * factor` into this vector without a temporary
    ///
    /// Same mismatch contract as `+=`: differing nominal lengths are a no-op.
    pub fn scaled_add(&mut self, other: &SparseVector, factor: f64) {
        if other.len != self.len || factor == 0.0 {
            return;
        }
        for (&i, &v) in &other.entries {
            let e = self.entries.entry(i).or_insert(0.0);
            *e += v * factor;
            let value = *e;
            self.cache[Self::slot_of(i)] = CacheSlot { tag: i, value };
        }
    }

    /// Replace every position with its exponential
    ///
    /// exp(0) = 1 is non-negligible, so implicit zeros materialize; results
    /// at or below a small epsilon are pruned back to implicit zero.
    pub fn exp_elem(&mut self) {
        for i in 0..self.len {
            let d = self.entries.get(&i).copied().unwrap_or(0.0).exp();
            if d > EXP_PRUNE_EPS {
                self.entries.insert(i, d);
            } else {
                self.entries.remove(&i);
            }
        }
        self.cache_clear();
    }

    /// Collapse the vector into an indicator of "value >= f"
    ///
    /// Explicit entries at or above `f` become 1.0; everything below `f`
    /// (explicit or not) ends up absent. `f` outside (0, 1] is ignored.
    pub fn apply_threshold(&mut self, f: f64) {
        if !(f > 0.0 && f <= 1.0) {
            return;
        }
        self.entries.retain(|_, v| *v >= f);
        for v in self.entries.values_mut() {
            *v = 1.0;
        }
        self.cache_clear();
    }

    /// Whether every explicit entry is a finite number
    ///
    /// NaN or infinite entries mark a degenerate fit.
    pub fn is_valid(&self) -> bool {
        self.entries.values().all(|v| v.is_finite())
    }

    /// Iterate explicit `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().map(|(&i, &v)| (i, v))
    }

    fn slot_of(i: u32) -> usize {
        (i as usize) % CACHE_SLOTS
    }

    fn cache_invalidate(&mut self, i: u32) {
        let slot = &mut self.cache[Self::slot_of(i)];
        if slot.tag == i {
            slot.tag = VACANT;
        }
    }

    fn cache_clear(&mut self) {
        for slot in &mut self.cache {
            slot.tag = VACANT;
        }
    }
}

impl PartialEq for SparseVector {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.entries == other.entries
    }
}

impl std::fmt::Debug for SparseVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseVector")
            .field("len", &self.len)
            .field("entries", &self.entries)
            .finish()
    }
}

impl AddAssign<&SparseVector> for SparseVector {
    /// Element-wise addition over the union of explicit entries
    ///
    /// Differing nominal lengths leave the left operand unchanged.
    fn add_assign(&mut self, other: &SparseVector) {
        if other.len != self.len {
            return;
        }
        for (&i, &v) in &other.entries {
            let e = self.entries.entry(i).or_insert(0.0);
            *e += v;
            let value = *e;
            self.cache[Self::slot_of(i)] = CacheSlot { tag: i, value };
        }
    }
}

impl SubAssign<&SparseVector> for SparseVector {
    /// Element-wise subtraction over the union of explicit entries
    ///
    /// Differing nominal lengths leave the left operand unchanged.
    fn sub_assign(&mut self, other: &SparseVector) {
        if other.len != self.len {
            return;
        }
        for (&i, &v) in &other.entries {
            let e = self.entries.entry(i).or_insert(0.0);
            *e -= v;
            let value = *e;
            self.cache[Self::slot_of(i)] = CacheSlot { tag: i, value };
        }
    }
}

impl MulAssign<&SparseVector> for SparseVector {
    /// Element-wise multiplication over this vector's explicit entries
    ///
    /// Products that come out exactly zero are pruned to implicit entries.
    /// Differing nominal lengths leave the left operand unchanged.
    fn mul_assign(&mut self, other: &SparseVector) {
        if other.len != self.len {
            return;
        }
        let keys: Vec<u32> = self.entries.keys().copied().collect();
        for i in keys {
            let rhs = other.entries.get(&i).copied().unwrap_or(0.0);
            let d = self.entries[&i] * rhs;
            if d == 0.0 {
                self.entries.remove(&i);
                self.cache_invalidate(i);
            } else {
                self.entries.insert(i, d);
                self.cache[Self::slot_of(i)] = CacheSlot { tag: i, value: d };
            }
        }
    }
}

impl MulAssign<f64> for SparseVector {
    /// Scale every explicit entry; scaling by exactly 0.0 drops all entries
    fn mul_assign(&mut self, f: f64) {
        if f == 0.0 {
            let len = self.len;
            self.resize(len);
            return;
        }
        for v in self.entries.values_mut() {
            *v *= f;
        }
        for slot in &mut self.cache {
            if slot.tag != VACANT {
                slot.value *= f;
            }
        }
    }
}

impl SubAssign<f64> for SparseVector {
    /// Subtract a scalar from every *explicit* entry only
    ///
    /// Implicit zeros are unaffected. Documented asymmetry, not a bug.
    fn sub_assign(&mut self, x: f64) {
        for v in self.entries.values_mut() {
            *v -= x;
        }
        for slot in &mut self.cache {
            if slot.tag != VACANT {
                slot.value -= x;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() {
        let mut v = SparseVector::new(1000);
        v.set(3, 1.5);
        v.set(700, -2.25);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(700), -2.25);
        assert_eq!(v.get(4), 0.0);
        assert_eq!(v.count_explicit(), 2);
    }

    #[test]
    fn test_cache_aliasing() {
        // Indices 5 and 5 + 64 share a cache slot; both must read correctly
        // in every interleaving.
        let mut v = SparseVector::new(256);
        v.set(5, 1.0);
        v.set(5 + CACHE_SLOTS as u32, 2.0);
        assert_eq!(v.get(5), 1.0);
        assert_eq!(v.get(5 + CACHE_SLOTS as u32), 2.0);
        v.set(5, 3.0);
        assert_eq!(v.get(5 + CACHE_SLOTS as u32), 2.0);
        assert_eq!(v.get(5), 3.0);
    }

    #[test]
    fn test_remove_reads_zero() {
        let mut v = SparseVector::new(128);
        v.set(7, 4.0);
        v.remove(7);
        assert_eq!(v.get(7), 0.0);
        assert!(!v.is_explicit(7));
        // removing an aliased neighbor must not clobber the survivor
        v.set(7, 4.0);
        v.set(71, 5.0);
        v.remove(7);
        assert_eq!(v.get(71), 5.0);
    }

    #[test]
    fn test_get_or_insert_materializes() {
        let mut v = SparseVector::new(64);
        assert_eq!(v.get_or_insert(10), 0.0);
        assert!(v.is_explicit(10));
        assert_eq!(v.count_explicit(), 1);
        // second call finds the cached entry
        assert_eq!(v.get_or_insert(10), 0.0);
        assert_eq!(v.count_explicit(), 1);
    }

    #[test]
    fn test_resize_discards_everything() {
        let mut v = SparseVector::new(64);
        v.set(1, 1.0);
        v.set(2, 2.0);
        v.resize(32);
        assert_eq!(v.len(), 32);
        assert_eq!(v.count_explicit(), 0);
        assert_eq!(v.get(1), 0.0);
    }

    #[test]
    fn test_upsize_keeps_data() {
        let mut v = SparseVector::new(4);
        v.set(3, 9.0);
        assert!(v.upsize(10));
        assert_eq!(v.len(), 10);
        assert_eq!(v.get(3), 9.0);
        assert_eq!(v.get(9), 0.0);
        assert!(!v.upsize(10));
        assert!(!v.upsize(2));
    }

    #[test]
    fn test_sum_exact() {
        let mut v = SparseVector::new(100);
        v.set(1, 0.5);
        v.set(40, 0.25);
        v.set(99, 0.125);
        assert_eq!(v.sum(), 0.875);
    }

    #[test]
    fn test_add_assign_union() {
        let mut a = SparseVector::from_entries(10, &[(0, 1.0), (2, 2.0)]);
        let b = SparseVector::from_entries(10, &[(2, 3.0), (5, 4.0)]);
        a += &b;
        assert_eq!(a.get(0), 1.0);
        assert_eq!(a.get(2), 5.0);
        assert_eq!(a.get(5), 4.0);
        assert_eq!(a.count_explicit(), 3);
    }

    #[test]
    fn test_mul_assign_prunes_zero_products() {
        let mut a = SparseVector::from_entries(10, &[(0, 2.0), (3, 5.0)]);
        let b = SparseVector::from_entries(10, &[(0, 4.0)]);
        a *= &b;
        assert_eq!(a.get(0), 8.0);
        assert!(!a.is_explicit(3));
        assert_eq!(a.count_explicit(), 1);
    }

    #[test]
    fn test_size_mismatch_is_noop() {
        let mut a = SparseVector::from_entries(10, &[(1, 1.0)]);
        let b = SparseVector::from_entries(11, &[(1, 5.0)]);
        a += &b;
        assert_eq!(a.get(1), 1.0);
        a -= &b;
        assert_eq!(a.get(1), 1.0);
        a *= &b;
        assert_eq!(a.get(1), 1.0);
    }

    #[test]
    fn test_scalar_mul_zero_clears() {
        let mut v = SparseVector::from_entries(10, &[(1, 1.0), (2, 2.0)]);
        v *= 0.0;
        assert_eq!(v.count_explicit(), 0);
        assert_eq!(v.len(), 10);
    }

    #[test]
    fn test_scalar_sub_explicit_only() {
        let mut v = SparseVector::from_entries(10, &[(1, 5.0), (7, 2.0)]);
        v -= 1.0;
        assert_eq!(v.get(1), 4.0);
        assert_eq!(v.get(7), 1.0);
        // implicit zeros untouched
        assert_eq!(v.get(0), 0.0);
        assert!(!v.is_explicit(0));
    }

    #[test]
    fn test_scaled_add() {
        let mut a = SparseVector::from_entries(10, &[(0, 1.0)]);
        let b = SparseVector::from_entries(10, &[(0, 2.0), (4, 3.0)]);
        a.scaled_add(&b, 0.5);
        assert_eq!(a.get(0), 2.0);
        assert_eq!(a.get(4), 1.5);
    }

    #[test]
    fn test_dot_intersection() {
        let a = SparseVector::from_entries(10, &[(0, 2.0), (3, 1.0), (9, 4.0)]);
        let b = SparseVector::from_entries(10, &[(3, 5.0), (9, 0.5)]);
        assert_eq!(a.dot(&b), 7.0);
        assert_eq!(b.dot(&a), 7.0);
        // dimension alignment is the caller's concern; implicit zeros make
        // the math indifferent to nominal lengths
        let c = SparseVector::from_entries(20, &[(3, 2.0)]);
        assert_eq!(a.dot(&c), 2.0);
    }

    #[test]
    fn test_exp_elem_materializes_and_prunes() {
        let mut v = SparseVector::new(4);
        v.set(0, 1.0);
        v.set(2, -20.0); // exp(-20) below pruning epsilon
        v.exp_elem();
        assert!((v.get(0) - std::f64::consts::E).abs() < 1e-12);
        assert_eq!(v.get(1), 1.0); // exp(0) materialized
        assert!(!v.is_explicit(2));
        assert_eq!(v.get(3), 1.0);
    }

    #[test]
    fn test_apply_threshold_idempotent() {
        let mut v = SparseVector::from_entries(8, &[(0, 0.9), (1, 0.4), (5, 0.6)]);
        v.apply_threshold(0.5);
        let once = v.clone();
        v.apply_threshold(0.5);
        assert_eq!(v, once);
        assert_eq!(v.get(0), 1.0);
        assert!(!v.is_explicit(1));
        assert_eq!(v.get(5), 1.0);
    }

    #[test]
    fn test_apply_threshold_out_of_range_ignored() {
        let mut v = SparseVector::from_entries(4, &[(0, 0.9)]);
        let before = v.clone();
        v.apply_threshold(0.0);
        v.apply_threshold(1.5);
        assert_eq!(v, before);
    }

    #[test]
    fn test_set_explicit_overwrites() {
        let mut v = SparseVector::from_entries(10, &[(1, 3.0), (4, -2.0)]);
        v.set_explicit(1.0);
        assert_eq!(v.get(1), 1.0);
        assert_eq!(v.get(4), 1.0);
        assert_eq!(v.count_explicit(), 2);
    }

    #[test]
    fn test_is_valid_flags_nan() {
        let mut v = SparseVector::from_entries(4, &[(0, 1.0)]);
        assert!(v.is_valid());
        v.set(1, f64::NAN);
        assert!(!v.is_valid());
        v.set(1, f64::INFINITY);
        assert!(!v.is_valid());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_get_panics() {
        let v = SparseVector::new(4);
        v.get(4);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_set_panics() {
        let mut v = SparseVector::new(4);
        v.set(9, 1.0);
    }
}
