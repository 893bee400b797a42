//! Archetype classification: which container shape a value is.
//!
//! The draft engine calls [`archetype_of`] once per candidate value at
//! draft-creation time and trusts the result for that node's lifetime.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The structural category of a value, governing clone/iterate/access
/// semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    /// Plain object: string-keyed entries.
    Object,
    /// Positional array.
    Array,
    /// Ordered map with arbitrary value keys.
    Map,
    /// Ordered set of unique members.
    Set,
    /// Scalars; never wrapped in a draft.
    NotDraftable,
}

impl Archetype {
    pub fn is_draftable(&self) -> bool {
        !matches!(self, Archetype::NotDraftable)
    }
}

pub fn archetype_of(value: &Value) -> Archetype {
    match value {
        Value::Object(_) => Archetype::Object,
        Value::Array(_) => Archetype::Array,
        Value::Map(_) => Archetype::Map,
        Value::Set(_) => Archetype::Set,
        _ => Archetype::NotDraftable,
    }
}

pub fn is_draftable(value: &Value) -> bool {
    archetype_of(value).is_draftable()
}
