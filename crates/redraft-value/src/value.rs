//! The immutable `Value` tree.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::key::Key;

/// An immutable JSON-like value with reference-counted containers.
///
/// Scalars are stored inline. The four draftable containers are behind
/// `Arc`, so `clone` is O(1) per container and structural sharing falls out
/// of ordinary ownership:
///
/// - `Object` — string-keyed entries in insertion order,
/// - `Array` — positional entries,
/// - `Map` — entries keyed by arbitrary values, in insertion order,
/// - `Set` — unique members in insertion order.
///
/// Equality is deep (with `Arc` pointer shortcuts); identity is
/// [`Value::ptr_eq`]. `Int` and `Float` never compare equal to each other,
/// which keeps `Eq` consistent with `Hash` so values can key a `Map` or
/// live in a `Set`.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(Arc<IndexMap<String, Value>>),
    Array(Arc<Vec<Value>>),
    Map(Arc<IndexMap<Value, Value>>),
    Set(Arc<IndexSet<Value>>),
}

// ── Constructors ──────────────────────────────────────────────────────────

impl Value {
    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
        Value::Object(Arc::new(entries.into_iter().collect()))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    pub fn set(members: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(Arc::new(members.into_iter().collect()))
    }
}

// ── Accessors ─────────────────────────────────────────────────────────────

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&IndexSet<Value>> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// True for the four Arc-backed container variants.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Value::Object(_) | Value::Array(_) | Value::Map(_) | Value::Set(_)
        )
    }

    /// Shorthand for object field access.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(m) => m.get(field),
            _ => None,
        }
    }

    /// Shorthand for array index access.
    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Array(a) => a.get(i),
            _ => None,
        }
    }

    /// Keyed access in the archetype-appropriate way.
    ///
    /// For sets, `Key::Item(m)` resolves to the stored member itself when
    /// present (membership lookup).
    pub fn get_key(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Value::Object(m), Key::Field(f)) => m.get(f),
            (Value::Array(a), Key::Index(i)) => a.get(*i),
            (Value::Map(m), Key::Item(k)) => m.get(k),
            (Value::Set(s), Key::Item(m)) => s.get(m),
            _ => None,
        }
    }

    pub fn has_key(&self, key: &Key) -> bool {
        self.get_key(key).is_some()
    }

    /// Keys of a container in its archetype-defined order; empty for scalars.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Object(m) => m.keys().cloned().map(Key::Field).collect(),
            Value::Array(a) => (0..a.len()).map(Key::Index).collect(),
            Value::Map(m) => m.keys().cloned().map(Key::Item).collect(),
            Value::Set(s) => s.iter().cloned().map(Key::Item).collect(),
            _ => Vec::new(),
        }
    }

    /// Entry count of a container; `None` for scalars.
    pub fn len_of(&self) -> Option<usize> {
        match self {
            Value::Object(m) => Some(m.len()),
            Value::Array(a) => Some(a.len()),
            Value::Map(m) => Some(m.len()),
            Value::Set(s) => Some(s.len()),
            _ => None,
        }
    }

    /// Reference identity: `Arc` pointer equality for containers, plain
    /// equality for scalars. This is the structural-sharing witness — a
    /// reused subtree is `ptr_eq` to the original, a rebuilt one is not.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (a, b) if !a.is_container() && !b.is_container() => a == b,
            _ => false,
        }
    }
}

// ── Equality and hashing ──────────────────────────────────────────────────

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // NaN is self-equal here so Eq is lawful and sets can hold it.
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

fn hash_of<T: Hash>(v: &T) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(i) => {
                state.write_u8(2);
                i.hash(state);
            }
            Value::Float(f) => {
                state.write_u8(3);
                // Canonicalize so -0.0 hashes like 0.0 and every NaN alike.
                let bits = if f.is_nan() {
                    f64::NAN.to_bits()
                } else if *f == 0.0 {
                    0.0f64.to_bits()
                } else {
                    f.to_bits()
                };
                state.write_u64(bits);
            }
            Value::String(s) => {
                state.write_u8(4);
                s.hash(state);
            }
            Value::Array(a) => {
                state.write_u8(5);
                state.write_usize(a.len());
                for v in a.iter() {
                    v.hash(state);
                }
            }
            // IndexMap/IndexSet equality is order-insensitive, so these
            // hashes combine entries commutatively.
            Value::Object(m) => {
                state.write_u8(6);
                state.write_usize(m.len());
                let mut acc = 0u64;
                for (k, v) in m.iter() {
                    acc ^= hash_of(&(k, v));
                }
                state.write_u64(acc);
            }
            Value::Map(m) => {
                state.write_u8(7);
                state.write_usize(m.len());
                let mut acc = 0u64;
                for (k, v) in m.iter() {
                    acc ^= hash_of(&(k, v));
                }
                state.write_u64(acc);
            }
            Value::Set(s) => {
                state.write_u8(8);
                state.write_usize(s.len());
                let mut acc = 0u64;
                for v in s.iter() {
                    acc ^= hash_of(v);
                }
                state.write_u64(acc);
            }
        }
    }
}

// ── Scalar conversions ────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::Array(Arc::new(v))
    }
}

// ── serde_json interop ────────────────────────────────────────────────────

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::array(a.into_iter().map(Value::from)),
            serde_json::Value::Object(m) => {
                Value::object(m.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl Value {
    /// Convert to `serde_json::Value`. `Map` degrades to a JSON object when
    /// every key is a string and to an array of `[key, value]` pairs
    /// otherwise; `Set` degrades to an array of members.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(a) => serde_json::Value::Array(a.iter().map(Value::to_json).collect()),
            Value::Object(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Map(m) => {
                if m.keys().all(|k| matches!(k, Value::String(_))) {
                    serde_json::Value::Object(
                        m.iter()
                            .map(|(k, v)| (k.as_str().unwrap_or_default().to_string(), v.to_json()))
                            .collect(),
                    )
                } else {
                    serde_json::Value::Array(
                        m.iter()
                            .map(|(k, v)| serde_json::Value::Array(vec![k.to_json(), v.to_json()]))
                            .collect(),
                    )
                }
            }
            Value::Set(s) => serde_json::Value::Array(s.iter().map(Value::to_json).collect()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for v in a.iter() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Object(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Set(s) => {
                let mut seq = serializer.serialize_seq(Some(s.len()))?;
                for v in s.iter() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // JSON has no map/set syntax, so those arrive as objects/arrays.
        Ok(Value::from(serde_json::Value::deserialize(deserializer)?))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_shares_containers() {
        let v = Value::from(json!({"a": [1, 2], "b": {"x": true}}));
        let w = v.clone();
        assert!(v.ptr_eq(&w));
        assert!(v.get("a").unwrap().ptr_eq(w.get("a").unwrap()));
    }

    #[test]
    fn deep_equality_across_distinct_arcs() {
        let a = Value::from(json!({"k": [1, 2, 3]}));
        let b = Value::from(json!({"k": [1, 2, 3]}));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn int_and_float_are_distinct() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn nan_is_self_equal_and_hash_stable() {
        let a = Value::Float(f64::NAN);
        let b = Value::Float(f64::NAN);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(
            hash_of(&Value::Float(0.0)),
            hash_of(&Value::Float(-0.0))
        );
    }

    #[test]
    fn set_membership_by_deep_equality() {
        let s = Value::set([Value::from(json!({"id": 1})), Value::from(2i64)]);
        let set = s.as_set().unwrap();
        assert!(set.contains(&Value::from(json!({"id": 1}))));
        assert!(set.contains(&Value::Int(2)));
        assert!(!set.contains(&Value::Int(3)));
    }

    #[test]
    fn keyed_access_per_archetype() {
        let obj = Value::from(json!({"a": 1}));
        assert_eq!(obj.get_key(&Key::Field("a".into())), Some(&Value::Int(1)));

        let arr = Value::from(json!([10, 20]));
        assert_eq!(arr.get_key(&Key::Index(1)), Some(&Value::Int(20)));
        assert_eq!(arr.get_key(&Key::Index(2)), None);

        let map = Value::map([(Value::Int(7), Value::from("seven"))]);
        assert_eq!(
            map.get_key(&Key::Item(Value::Int(7))),
            Some(&Value::String("seven".into()))
        );

        let set = Value::set([Value::Int(1)]);
        assert_eq!(set.get_key(&Key::Item(Value::Int(1))), Some(&Value::Int(1)));
    }

    #[test]
    fn keys_preserve_order() {
        let v = Value::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<_> = v.keys();
        assert_eq!(
            keys,
            vec![
                Key::Field("z".into()),
                Key::Field("a".into()),
                Key::Field("m".into())
            ]
        );
    }

    #[test]
    fn json_round_trip() {
        let j = json!({"a": [1, 2.5, "x", null, true], "b": {"c": 3}});
        let v = Value::from(j.clone());
        assert_eq!(v.to_json(), j);
    }

    #[test]
    fn map_to_json_degrades() {
        let string_keyed = Value::map([(Value::from("k"), Value::Int(1))]);
        assert_eq!(string_keyed.to_json(), json!({"k": 1}));

        let value_keyed = Value::map([(Value::Int(1), Value::from("one"))]);
        assert_eq!(value_keyed.to_json(), json!([[1, "one"]]));
    }

    #[test]
    fn serde_serialize_matches_to_json() {
        let v = Value::from(json!({"a": [1, {"b": false}]}));
        let out = serde_json::to_value(&v).unwrap();
        assert_eq!(out, v.to_json());
    }

    #[test]
    fn serde_deserialize_via_json() {
        let v: Value = serde_json::from_str(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(v, Value::from(json!({"a": [1, 2]})));
    }
}
