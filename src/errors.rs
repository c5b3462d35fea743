use thiserror::Error;

/// Errors reported by [`SnapSet`](crate::SnapSet) operations.
///
/// Deleting an absent value is not an error; [`delete`](crate::SnapSet::delete)
/// reports that case as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapSetError {
    /// A random element was requested from a set with no elements.
    #[error("cannot pick a random element from an empty set")]
    EmptySet,
    /// [`try_insert`](crate::SnapSet::try_insert) was given a value that is
    /// already present.
    #[error("value is already present at slot {slot}")]
    DuplicateInsert {
        /// The slot the existing copy occupies.
        slot: usize,
    },
}

/// Diagnostic produced when the index and the dense array disagree.
pub type SetValidityError = String;
