//! Change records: generation during finalize, replay against any value.
//!
//! A committed scope can report what it did as a pair of patch lists: the
//! forward list replays the change onto the original value, the inverse list
//! undoes it on the result. Patches describe net effects at the coarsest
//! level that stays correct, so replacing a whole subtree is one op no
//! matter how many edits happened inside it.

mod apply;
mod generate;
mod types;

pub use apply::apply_patches;
pub(crate) use generate::{generate_patches, replacement_patches};
pub use types::{PatchOp, Patches};
