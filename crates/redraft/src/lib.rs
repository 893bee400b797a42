//! Produce new immutable values by mutating a draft.
//!
//! A call to [`produce`] opens a scope over a base [`Value`], hands the
//! recipe a [`Draft`] that looks and feels mutable, and folds the recorded
//! edits into a new immutable value when the recipe returns. Untouched
//! subtrees of the result are shared with the base, an untouched recipe
//! returns the base itself, and [`produce_with_patches`] additionally
//! reports everything that happened as replayable forward and inverse
//! patch lists.
//!
//! ```
//! use redraft::{produce, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({"todos": [{"title": "read", "done": false}]}));
//! let next = produce(&base, |draft| {
//!     let todos = draft.get_draft("todos")?;
//!     todos.get_draft(0)?.set("done", true)?;
//!     Ok(None)
//! })?;
//!
//! let todo = next.get("todos").unwrap().index(0).unwrap();
//! assert_eq!(todo.get("done"), Some(&Value::Bool(true)));
//! // The base is untouched.
//! let original = base.get("todos").unwrap().index(0).unwrap();
//! assert_eq!(original.get("done"), Some(&Value::Bool(false)));
//! # Ok::<(), redraft::DraftError>(())
//! ```

mod draft;
mod error;
mod finalize;
mod node;
mod patch;
mod produce;
mod scope;
mod surrogate;

pub use draft::{Draft, DraftEntry};
pub use error::{DraftError, DraftResult};
pub use patch::{apply_patches, PatchOp, Patches};
pub use produce::{
    create_draft, create_draft_in, finish_draft, finish_draft_with_patches, produce, produce_in,
    produce_with_listener, produce_with_patches, produce_with_patches_in, Options, Produced,
};
pub use surrogate::SurrogateKind;

pub use redraft_value::{archetype_of, is_draftable, Archetype, Key, Path, Value};
