//! Keys and paths for addressing into containers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One addressing step into a container.
///
/// `Field` addresses an object property, `Index` an array position, and
/// `Item` a map key or set member. On the wire a key is its natural JSON
/// form: a number for `Index`, a string for `Field`, anything else for
/// `Item`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Field(String),
    Item(Value),
}

/// A sequence of keys from the root of a value.
pub type Path = Vec<Key>;

impl From<&str> for Key {
    fn from(v: &str) -> Key {
        Key::Field(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Key {
        Key::Field(v)
    }
}

impl From<usize> for Key {
    fn from(v: usize) -> Key {
        Key::Index(v)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(s) => write!(f, "{s}"),
            Key::Index(i) => write!(f, "{i}"),
            Key::Item(v) => write!(f, "{}", v.to_json()),
        }
    }
}

/// Render a path as a slash-separated pointer-like string, for messages.
pub fn format_path(path: &[Key]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&key.to_string());
    }
    out
}
