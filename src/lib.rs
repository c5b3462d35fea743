#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]
#![deny(missing_docs)]

//! Snapset, a hash set that can also hand out a uniformly random member in O(1).
//!
//! ```
//! use snapset::{SnapSet, DEFAULT_BUCKET_SIZE};
//!
//! let mut pool = SnapSet::new(DEFAULT_BUCKET_SIZE);
//! pool.insert("a");
//! pool.insert("b");
//! assert_eq!(pool.delete(&"a"), Some(0));
//! assert_eq!(pool.get_random(), Ok(&"b"));
//! ```

mod errors;
mod rng;
mod set;

pub use errors::{SetValidityError, SnapSetError};
pub use rng::XorShiftState;
pub use set::{DEFAULT_BUCKET_SIZE, RandomAccessSet, SnapSet};
