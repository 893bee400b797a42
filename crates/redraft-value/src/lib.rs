//! Immutable value model for the redraft engine.
//!
//! A [`Value`] is a JSON-like tree whose containers live behind `Arc`, so
//! cloning is cheap and unmodified subtrees can be shared between an old
//! value and a value produced from it. The crate also carries the pieces
//! the draft engine consumes:
//!
//! - [`Archetype`] classification ([`archetype_of`], [`is_draftable`]),
//! - [`Key`] / [`Path`] addressing into containers,
//! - [`Shallow`], the mutable shallow copy of a single container that a
//!   draft node edits before sealing it back into an immutable [`Value`].
//!
//! # Example
//!
//! ```
//! use redraft_value::{archetype_of, Archetype, Value};
//!
//! let v = Value::from(serde_json::json!({"a": [1, 2, 3]}));
//! assert_eq!(archetype_of(&v), Archetype::Object);
//!
//! // Cloning shares the underlying containers.
//! let w = v.clone();
//! assert!(v.ptr_eq(&w));
//! ```

pub mod archetype;
pub mod container;
pub mod key;
pub mod value;

pub use archetype::{archetype_of, is_draftable, Archetype};
pub use container::Shallow;
pub use key::{format_path, Key, Path};
pub use value::Value;
