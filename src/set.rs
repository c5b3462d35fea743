use std::{
    borrow::Borrow,
    collections::{HashMap, hash_map::Entry},
    fmt::{self, Debug},
    hash::{BuildHasher, Hash},
};

use fxhash::FxBuildHasher;
use rand::{Rng, RngCore, SeedableRng};

use crate::{
    errors::{SetValidityError, SnapSetError},
    rng::XorShiftState,
};

/// The default capacity hint for a new set's position index.
pub const DEFAULT_BUCKET_SIZE: usize = 1 << 5;

/// The four core operations of a set that supports O(1) uniform sampling.
pub trait RandomAccessSet<T> {
    /// Adds `value` and returns the slot it occupies.
    fn insert(&mut self, value: T) -> usize;

    /// Removes `value`, returning the slot it occupied, or `None` if it was absent.
    fn delete(&mut self, value: &T) -> Option<usize>;

    /// Returns `true` if `value` is present.
    fn exists(&self, value: &T) -> bool;

    /// Returns a uniformly random element.
    ///
    /// # Errors
    ///
    /// Returns [`SnapSetError::EmptySet`] if there are no elements.
    fn get_random(&mut self) -> Result<&T, SnapSetError>;
}

/// A hash set with O(1) insertion, deletion, membership test and uniform
/// random sampling.
///
/// Elements live in a gapless dense array; a position index maps each element
/// to its slot in that array. Deletion moves the tail element into the freed
/// slot, so **slots are not stable**: any delete other than of the tail element
/// may relocate one surviving element. Do not hold on to slots across deletes.
///
/// `T` must be usable as a hash map key (`Hash + Eq`) and `Clone`, because
/// each element is stored once in the index and once in the dense array.
///
/// Inserting a value that is already present does not add a second copy;
/// the existing slot is returned unchanged. Use [`SnapSet::insert_full`] or
/// [`SnapSet::try_insert`] to tell the two cases apart.
///
/// The set owns its random source `R` and is not synchronised. Callers that
/// share one across threads must wrap every operation in a single lock, since
/// even [`SnapSet::get_random`] mutates the generator.
#[derive(Clone)]
pub struct SnapSet<T, R = XorShiftState, S = FxBuildHasher> {
    index: HashMap<T, usize, S>,
    dense: Vec<T>,
    last_slot: Option<usize>,
    rng: R,
}

impl<T> SnapSet<T>
where
    T: Hash + Eq + Clone,
{
    /// Creates an empty set whose index is pre-sized for `capacity_hint`
    /// elements. The random source is seeded from the process clock.
    #[must_use]
    pub fn new(capacity_hint: usize) -> Self {
        Self::with_rng(capacity_hint, XorShiftState::from_time())
    }
}

impl<T, R, S> SnapSet<T, R, S>
where
    T: Hash + Eq + Clone,
    R: RngCore,
    S: BuildHasher + Default,
{
    /// Creates an empty set that draws from `rng`.
    pub fn with_rng(capacity_hint: usize, rng: R) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(capacity_hint, S::default()),
            dense: Vec::new(),
            last_slot: None,
            rng,
        }
    }

    /// Creates an empty set with a deterministically seeded random source.
    #[must_use]
    pub fn with_seed(capacity_hint: usize, seed: u64) -> Self
    where
        R: SeedableRng,
    {
        Self::with_rng(capacity_hint, R::seed_from_u64(seed))
    }

    /// Adds `value` to the end of the dense array and returns its slot.
    ///
    /// If `value` is already present nothing is appended and its current
    /// slot is returned.
    pub fn insert(&mut self, value: T) -> usize {
        self.insert_full(value).0
    }

    /// Like [`SnapSet::insert`], but also reports whether `value` was newly added.
    pub fn insert_full(&mut self, value: T) -> (usize, bool) {
        let inserted = match self.index.entry(value) {
            Entry::Occupied(entry) => {
                tracing::trace!(slot = *entry.get(), "duplicate insert ignored");
                (*entry.get(), false)
            }
            Entry::Vacant(entry) => {
                let slot = self.dense.len();
                self.dense.push(entry.key().clone());
                entry.insert(slot);
                self.last_slot = Some(slot);
                (slot, true)
            }
        };
        #[cfg(debug_assertions)]
        self.check_validity().unwrap();
        inserted
    }

    /// Adds `value`, refusing values that are already present.
    ///
    /// # Errors
    ///
    /// Returns [`SnapSetError::DuplicateInsert`] carrying the existing slot if
    /// `value` is already in the set.
    pub fn try_insert(&mut self, value: T) -> Result<usize, SnapSetError> {
        match self.insert_full(value) {
            (slot, true) => Ok(slot),
            (slot, false) => Err(SnapSetError::DuplicateInsert { slot }),
        }
    }

    /// Removes `value` by swapping the tail element into its slot.
    ///
    /// Returns the slot `value` occupied, which now holds the element that was
    /// previously last (or is gone, if `value` was itself last). Returns
    /// `None` and leaves the set untouched if `value` is absent.
    pub fn delete<Q>(&mut self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(value)?;
        self.dense.swap_remove(slot);
        self.repoint(slot);
        self.last_slot = self.dense.len().checked_sub(1);
        #[cfg(debug_assertions)]
        self.check_validity().unwrap();
        Some(slot)
    }

    /// Returns `true` if `value` is present.
    pub fn exists<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(value)
    }

    /// Returns a uniformly random element of the set.
    ///
    /// # Errors
    ///
    /// Returns [`SnapSetError::EmptySet`] if the set has no elements.
    pub fn get_random(&mut self) -> Result<&T, SnapSetError> {
        let slot = self.random_slot()?;
        Ok(&self.dense[slot])
    }

    /// Removes and returns a uniformly random element of the set.
    ///
    /// # Errors
    ///
    /// Returns [`SnapSetError::EmptySet`] if the set has no elements.
    pub fn pop_random(&mut self) -> Result<T, SnapSetError> {
        let slot = self.random_slot()?;
        let value = self.dense.swap_remove(slot);
        self.index.remove(&value);
        self.repoint(slot);
        self.last_slot = self.dense.len().checked_sub(1);
        #[cfg(debug_assertions)]
        self.check_validity().unwrap();
        Ok(value)
    }

    /// Returns the current slot of `value`, if present.
    pub fn slot_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value).copied()
    }

    /// Checks that the index and the dense array describe the same elements,
    /// and that every element's recorded slot is where it actually lives.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn check_validity(&self) -> Result<(), SetValidityError> {
        if self.index.len() != self.dense.len() {
            return Err(format!(
                "index holds {} entries but dense array holds {}",
                self.index.len(),
                self.dense.len()
            ));
        }
        for (slot, value) in self.dense.iter().enumerate() {
            match self.index.get(value) {
                Some(&recorded) if recorded == slot => {}
                Some(&recorded) => {
                    return Err(format!("element in slot {slot} is indexed at slot {recorded}"));
                }
                None => return Err(format!("element in slot {slot} is missing from the index")),
            }
        }
        if self.last_slot.is_some_and(|slot| slot >= self.dense.len()) {
            return Err(format!(
                "last slot {:?} is out of range for {} elements",
                self.last_slot,
                self.dense.len()
            ));
        }
        Ok(())
    }

    fn random_slot(&mut self) -> Result<usize, SnapSetError> {
        if self.dense.is_empty() {
            tracing::debug!("random pick requested from an empty set");
            return Err(SnapSetError::EmptySet);
        }
        Ok(self.rng.random_range(0..self.dense.len()))
    }

    /// Points the index entry of whatever now sits in `slot` back at `slot`,
    /// after a swap-remove moved the old tail there.
    /// Does nothing when the removed element was the tail.
    fn repoint(&mut self, slot: usize) {
        if let Some(recorded) = self.dense.get(slot).and_then(|moved| self.index.get_mut(moved)) {
            *recorded = slot;
        }
    }

    /// Removes every element. The random source is kept as is.
    pub fn clear(&mut self) {
        self.index.clear();
        self.dense.clear();
        self.last_slot = None;
        #[cfg(debug_assertions)]
        self.check_validity().unwrap();
    }

    /// Swaps two dense entries without touching the index.
    #[cfg(test)]
    fn swap_dense_unindexed(&mut self, a: usize, b: usize) {
        self.dense.swap(a, b);
    }
}

impl<T, R, S> SnapSet<T, R, S> {
    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns the element currently in `slot`.
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.dense.get(slot)
    }

    /// The dense array. Order is unspecified and changes on deletion.
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Iterates over the elements in dense-array order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.dense.iter()
    }

    /// The slot of the most recently inserted element, updated to the new
    /// tail after a removal. `None` when the set is empty.
    pub const fn last_slot(&self) -> Option<usize> {
        self.last_slot
    }
}

impl<T, R, S> RandomAccessSet<T> for SnapSet<T, R, S>
where
    T: Hash + Eq + Clone,
    R: RngCore,
    S: BuildHasher + Default,
{
    fn insert(&mut self, value: T) -> usize {
        Self::insert(self, value)
    }

    fn delete(&mut self, value: &T) -> Option<usize> {
        Self::delete(self, value)
    }

    fn exists(&self, value: &T) -> bool {
        Self::exists(self, value)
    }

    fn get_random(&mut self) -> Result<&T, SnapSetError> {
        Self::get_random(self)
    }
}

impl<T> Default for SnapSet<T>
where
    T: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_SIZE)
    }
}

impl<T: Debug, R, S> Debug for SnapSet<T, R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.dense.iter()).finish()
    }
}

impl<T, R, S> Extend<T> for SnapSet<T, R, S>
where
    T: Hash + Eq + Clone,
    R: RngCore,
    S: BuildHasher + Default,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.index.reserve(iter.size_hint().0);
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for SnapSet<T>
where
    T: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::new(iter.size_hint().0.max(DEFAULT_BUCKET_SIZE));
        set.extend(iter);
        set
    }
}

impl<'a, T, R, S> IntoIterator for &'a SnapSet<T, R, S> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.dense.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::{Rng, SeedableRng};

    use super::{DEFAULT_BUCKET_SIZE, RandomAccessSet, SnapSet};
    use crate::{errors::SnapSetError, rng::XorShiftState};

    fn seeded<T: std::hash::Hash + Eq + Clone>(seed: u64) -> SnapSet<T> {
        SnapSet::with_seed(DEFAULT_BUCKET_SIZE, seed)
    }

    #[test]
    fn insert_returns_consecutive_slots() {
        let mut set = SnapSet::new(DEFAULT_BUCKET_SIZE);
        assert_eq!(set.insert(10), 0);
        assert!(set.exists(&10));
        assert_eq!(set.insert(20), 1);
        assert!(set.exists(&10) && set.exists(&20));
        for (n, v) in (30..40).enumerate() {
            assert_eq!(set.insert(v), n + 2);
        }
        assert_eq!(set.last_slot(), Some(11));
        set.check_validity().unwrap();
    }

    #[test]
    fn delete_swaps_tail_into_hole() {
        let mut set = seeded(1);
        assert_eq!(set.insert(10), 0);
        assert_eq!(set.insert(20), 1);
        assert_eq!(set.insert(30), 2);

        assert_eq!(set.delete(&20), Some(1));
        assert!(!set.exists(&20));
        assert!(set.exists(&10));
        assert!(set.exists(&30));
        assert_eq!(set.as_slice(), &[10, 30]);
        assert_eq!(set.slot_of(&30), Some(1));
        assert_eq!(set.get(1), Some(&30));
        assert_eq!(set.last_slot(), Some(1));
        set.check_validity().unwrap();
    }

    #[test]
    fn delete_tail_and_only_element() {
        let mut set = seeded(2);
        set.insert("a");
        set.insert("b");
        assert_eq!(set.delete(&"b"), Some(1));
        assert_eq!(set.as_slice(), &["a"]);
        assert_eq!(set.delete(&"a"), Some(0));
        assert!(set.is_empty());
        assert_eq!(set.last_slot(), None);
        set.check_validity().unwrap();
    }

    #[test]
    fn delete_absent_is_a_no_op() {
        let mut set = seeded(3);
        assert_eq!(set.delete(&10), None);

        set.insert(10);
        set.insert(20);
        set.insert(30);
        assert_eq!(set.delete(&40), None);
        assert_eq!(set.len(), 3);

        assert_eq!(set.delete(&20), Some(1));
        assert_eq!(set.delete(&20), None);
        assert_eq!(set.len(), 2);
        set.check_validity().unwrap();
    }

    #[test]
    fn exists_with_borrowed_keys() {
        let mut set: SnapSet<String> = SnapSet::default();
        set.insert("apple".to_owned());
        set.insert("banana".to_owned());
        assert!(set.exists("apple"));
        assert!(!set.exists("cherry"));
        assert_eq!(set.delete("apple"), Some(0));
        assert!(!set.exists("apple"));
        assert_eq!(set.slot_of("banana"), Some(0));
    }

    #[test]
    fn duplicate_insert_keeps_existing_slot() {
        let mut set = seeded(4);
        assert_eq!(set.insert(7), 0);
        assert_eq!(set.insert(8), 1);
        assert_eq!(set.insert(7), 0);
        assert_eq!(set.insert_full(7), (0, false));
        assert_eq!(set.insert_full(9), (2, true));
        assert_eq!(set.len(), 3);
        assert_eq!(set.last_slot(), Some(2));
        set.check_validity().unwrap();

        // once removed, the value can come back at the tail.
        assert_eq!(set.delete(&7), Some(0));
        assert_eq!(set.insert(7), 2);
        assert_eq!(set.iter().filter(|&&v| v == 7).count(), 1);
    }

    #[test]
    fn try_insert_reports_duplicates() {
        let mut set = seeded(5);
        assert_eq!(set.try_insert('x'), Ok(0));
        assert_eq!(set.try_insert('y'), Ok(1));
        assert_eq!(
            set.try_insert('x'),
            Err(SnapSetError::DuplicateInsert { slot: 0 })
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn random_on_empty_set_is_an_error() {
        let mut set: SnapSet<u32> = SnapSet::new(DEFAULT_BUCKET_SIZE);
        assert_eq!(set.get_random(), Err(SnapSetError::EmptySet));
        assert_eq!(set.pop_random(), Err(SnapSetError::EmptySet));

        set.insert(1);
        set.delete(&1);
        assert_eq!(set.get_random(), Err(SnapSetError::EmptySet));
    }

    #[test]
    fn random_covers_every_element() {
        let mut set = seeded(12);
        set.insert(1);
        set.insert(2);
        set.insert(3);

        let mut seen = HashSet::new();
        for _ in 0..100 {
            seen.insert(*set.get_random().unwrap());
        }
        assert_eq!(seen, HashSet::from([1, 2, 3]));

        set.delete(&2);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let v = *set.get_random().unwrap();
            assert_ne!(v, 2, "deleted element was sampled");
            seen.insert(v);
        }
        assert_eq!(seen, HashSet::from([1, 3]));
    }

    #[test]
    fn random_is_roughly_uniform() {
        let mut set = seeded(6);
        set.extend(0..10u32);
        // churn the set so the dense order no longer matches insertion order.
        for v in [3, 7, 0] {
            set.delete(&v);
        }
        set.extend([3, 7, 0]);

        let mut counts = HashMap::new();
        for _ in 0..100_000 {
            *counts.entry(*set.get_random().unwrap()).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), 10);
        for (value, count) in counts {
            assert!((9_000..=11_000).contains(&count), "{value} drawn {count} times");
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = seeded(99);
        let mut b = seeded(99);
        a.extend(0..50);
        b.extend(0..50);
        for _ in 0..200 {
            assert_eq!(a.get_random(), b.get_random());
        }
    }

    #[test]
    fn pop_random_drains_without_repeats() {
        let mut set = seeded(7);
        set.extend(0..64);
        let mut drained = HashSet::new();
        while let Ok(v) = set.pop_random() {
            assert!(drained.insert(v), "{v} popped twice");
            set.check_validity().unwrap();
        }
        assert_eq!(drained.len(), 64);
        assert!(set.is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let mut set: SnapSet<i32> = (0..10).collect();
        set.clear();
        assert!(set.is_empty());
        assert!(!set.exists(&3));
        assert_eq!(set.last_slot(), None);
        assert_eq!(set.insert(3), 0);
        set.check_validity().unwrap();
    }

    #[test]
    fn random_operations_keep_index_and_array_in_step() {
        let mut set = seeded(8);
        let mut model = HashSet::new();
        let mut driver = XorShiftState::seed_from_u64(8);

        for _ in 0..5_000 {
            let value = driver.random_range(0..200u32);
            if driver.random_bool(0.55) {
                let (slot, added) = set.insert_full(value);
                assert_eq!(added, model.insert(value));
                assert_eq!(set.get(slot), Some(&value));
            } else {
                let before = set.len();
                match set.delete(&value) {
                    Some(slot) => {
                        assert!(model.remove(&value));
                        assert!(!set.exists(&value));
                        assert!(slot <= set.len());
                    }
                    None => {
                        assert!(!model.contains(&value));
                        assert_eq!(set.len(), before);
                    }
                }
            }
            set.check_validity().unwrap();
            assert_eq!(set.len(), model.len());
        }

        for v in &model {
            let slot = set.slot_of(v).unwrap();
            assert_eq!(set.as_slice()[slot], *v);
        }
    }

    #[test]
    fn usable_through_the_trait() {
        fn churn(set: &mut impl RandomAccessSet<u8>) -> Option<u8> {
            set.insert(1);
            set.insert(2);
            set.delete(&1)?;
            if set.exists(&1) {
                return None;
            }
            set.get_random().ok().copied()
        }

        let mut set: SnapSet<u8> = seeded(9);
        assert_eq!(churn(&mut set), Some(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "indexed at slot")]
    fn mutation_detects_corrupted_dense_array() {
        let mut set = seeded(13);
        set.insert(1);
        set.insert(2);
        set.check_validity().unwrap();
        set.swap_dense_unindexed(0, 1);
        assert!(set.check_validity().is_err());
        set.insert(3);
    }

    #[test]
    fn debug_lists_elements() {
        let mut set = seeded(10);
        set.insert(5);
        assert_eq!(format!("{set:?}"), "{5}");
    }
}
