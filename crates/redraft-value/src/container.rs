//! Mutable shallow copies of containers.
//!
//! A [`Shallow`] is the one mutable representation in the system: the
//! copy-on-write buffer a draft node edits. It duplicates a container one
//! level deep (children stay `Arc`-shared), preserves entry order for every
//! archetype, and is sealed back into an immutable [`Value`] exactly once.

use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

use crate::archetype::Archetype;
use crate::key::Key;
use crate::value::Value;

/// A mutable shallow duplicate of a single container.
#[derive(Clone, Debug)]
pub enum Shallow {
    Object(IndexMap<String, Value>),
    Array(Vec<Value>),
    Map(IndexMap<Value, Value>),
    Set(IndexSet<Value>),
}

impl Shallow {
    /// Shallow-clone a container value; `None` for scalars.
    ///
    /// Entries are `Value` clones, so children remain shared with the
    /// original until they are themselves replaced.
    pub fn of(value: &Value) -> Option<Shallow> {
        match value {
            Value::Object(m) => Some(Shallow::Object((**m).clone())),
            Value::Array(a) => Some(Shallow::Array((**a).clone())),
            Value::Map(m) => Some(Shallow::Map((**m).clone())),
            Value::Set(s) => Some(Shallow::Set((**s).clone())),
            _ => None,
        }
    }

    pub fn archetype(&self) -> Archetype {
        match self {
            Shallow::Object(_) => Archetype::Object,
            Shallow::Array(_) => Archetype::Array,
            Shallow::Map(_) => Archetype::Map,
            Shallow::Set(_) => Archetype::Set,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Shallow::Object(m) => m.len(),
            Shallow::Array(a) => a.len(),
            Shallow::Map(m) => m.len(),
            Shallow::Set(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Shallow::Object(m), Key::Field(f)) => m.get(f),
            (Shallow::Array(a), Key::Index(i)) => a.get(*i),
            (Shallow::Map(m), Key::Item(k)) => m.get(k),
            (Shallow::Set(s), Key::Item(m)) => s.get(m),
            _ => None,
        }
    }

    pub fn has(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Write `value` at `key`. For arrays, `Index(len)` appends. For sets,
    /// `Item` inserts the member. Returns `false` when the key kind does not
    /// fit the archetype or an array index is past the end.
    pub fn set(&mut self, key: &Key, value: Value) -> bool {
        match (self, key) {
            (Shallow::Object(m), Key::Field(f)) => {
                m.insert(f.clone(), value);
                true
            }
            (Shallow::Array(a), Key::Index(i)) => {
                if *i < a.len() {
                    a[*i] = value;
                    true
                } else if *i == a.len() {
                    a.push(value);
                    true
                } else {
                    false
                }
            }
            (Shallow::Map(m), Key::Item(k)) => {
                m.insert(k.clone(), value);
                true
            }
            (Shallow::Set(s), Key::Item(_)) => {
                s.insert(value);
                true
            }
            _ => false,
        }
    }

    /// Remove the entry at `key`, preserving the order of the remaining
    /// entries. Array positions are removed via [`Shallow::remove_at`].
    pub fn delete(&mut self, key: &Key) -> Option<Value> {
        match (self, key) {
            (Shallow::Object(m), Key::Field(f)) => m.shift_remove(f),
            (Shallow::Map(m), Key::Item(k)) => m.shift_remove(k),
            (Shallow::Set(s), Key::Item(m)) => s.shift_take(m),
            _ => None,
        }
    }

    /// Array splice: insert at `index`, shifting later elements right.
    pub fn insert_at(&mut self, index: usize, value: Value) -> bool {
        match self {
            Shallow::Array(a) if index <= a.len() => {
                a.insert(index, value);
                true
            }
            _ => false,
        }
    }

    /// Array splice: remove at `index`, shifting later elements left.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        match self {
            Shallow::Array(a) if index < a.len() => Some(a.remove(index)),
            _ => None,
        }
    }

    /// Replace a set member in place, keeping its position.
    pub fn replace_item(&mut self, old: &Value, new: Value) -> bool {
        match self {
            Shallow::Set(s) => match s.get_index_of(old) {
                Some(i) => {
                    s.shift_remove(old);
                    s.shift_insert(i, new);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<Key> {
        match self {
            Shallow::Object(m) => m.keys().cloned().map(Key::Field).collect(),
            Shallow::Array(a) => (0..a.len()).map(Key::Index).collect(),
            Shallow::Map(m) => m.keys().cloned().map(Key::Item).collect(),
            Shallow::Set(s) => s.iter().cloned().map(Key::Item).collect(),
        }
    }

    /// Iterate key/value pairs in archetype-defined order.
    pub fn each(&self, mut f: impl FnMut(&Key, &Value)) {
        match self {
            Shallow::Object(m) => {
                for (k, v) in m.iter() {
                    f(&Key::Field(k.clone()), v);
                }
            }
            Shallow::Array(a) => {
                for (i, v) in a.iter().enumerate() {
                    f(&Key::Index(i), v);
                }
            }
            Shallow::Map(m) => {
                for (k, v) in m.iter() {
                    f(&Key::Item(k.clone()), v);
                }
            }
            Shallow::Set(s) => {
                for v in s.iter() {
                    f(&Key::Item(v.clone()), v);
                }
            }
        }
    }

    /// Seal the copy into an immutable value. This is the freeze step: once
    /// behind the `Arc` there is no mutable access again.
    pub fn seal(self) -> Value {
        match self {
            Shallow::Object(m) => Value::Object(Arc::new(m)),
            Shallow::Array(a) => Value::Array(Arc::new(a)),
            Shallow::Map(m) => Value::Map(Arc::new(m)),
            Shallow::Set(s) => Value::Set(Arc::new(s)),
        }
    }
}
