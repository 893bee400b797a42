//! Replay a patch list against a draft or a plain value.
//!
//! The primary path applies ops onto a live draft, walking each op's path
//! from the draft root and materializing intermediate drafts as it goes.
//! [`apply_patches`] runs the same machinery against a plain value through
//! an implicit scope; ops addressing the root swap the working value
//! wholesale between scopes. Ops apply strictly in list order and the whole
//! application fails on the first op whose path does not resolve.

use redraft_value::{format_path, Archetype, Key, Shallow, Value};

use crate::draft::{Draft, DraftEntry};
use crate::error::{DraftError, DraftResult};
use crate::produce::produce;

use super::types::PatchOp;

enum Edit<'a> {
    Add(&'a Value),
    Replace(&'a Value),
    /// Carries the removed set member when the op recorded one.
    Remove(Option<&'a Value>),
}

impl<'a> Edit<'a> {
    fn of(op: &'a PatchOp) -> Edit<'a> {
        match op {
            PatchOp::Add { value, .. } => Edit::Add(value),
            PatchOp::Replace { value, .. } => Edit::Replace(value),
            PatchOp::Remove { value, .. } => Edit::Remove(value.as_ref()),
        }
    }
}

fn missing(path: &[Key]) -> DraftError {
    DraftError::PatchPathNotFound(format_path(path))
}

/// Paths decoded from JSON lose the distinction between an index, a field
/// and an item key. Re-key against the container actually being addressed.
fn coerce(archetype: Archetype, key: &Key) -> Key {
    match (archetype, key) {
        (Archetype::Map | Archetype::Set, Key::Index(i)) => Key::Item(Value::Int(*i as i64)),
        (Archetype::Map | Archetype::Set, Key::Field(f)) => Key::Item(Value::String(f.clone())),
        _ => key.clone(),
    }
}

fn fits(archetype: Archetype, key: &Key) -> bool {
    matches!(
        (archetype, key),
        (Archetype::Object, Key::Field(_))
            | (Archetype::Array, Key::Index(_))
            | (Archetype::Map | Archetype::Set, Key::Item(_))
    )
}

// ── Functional fallback for plain subtrees ────────────────────────────────

/// Apply `edit` at `path` inside `target`, rebuilding the container spine.
/// Used when a path crosses into a subtree that was assigned during the
/// recipe and is therefore plain data, not a draft. `full` is the op's
/// complete path, kept for error reporting.
fn edit_at(target: &Value, path: &[Key], full: &[Key], edit: &Edit) -> DraftResult<Value> {
    let Some((key, rest)) = path.split_first() else {
        return match edit {
            // An empty path addresses the whole document.
            Edit::Replace(v) | Edit::Add(v) => Ok((*v).clone()),
            Edit::Remove(_) => Err(missing(full)),
        };
    };
    let Some(mut shallow) = Shallow::of(target) else {
        return Err(missing(full));
    };
    let key = coerce(shallow.archetype(), key);
    if !fits(shallow.archetype(), &key) {
        return Err(missing(full));
    }
    if !rest.is_empty() {
        let Some(child) = shallow.get(&key).cloned() else {
            return Err(missing(full));
        };
        let rebuilt = edit_at(&child, rest, full, edit)?;
        if let Shallow::Set(_) = shallow {
            shallow.replace_item(&child, rebuilt);
        } else {
            shallow.set(&key, rebuilt);
        }
        return Ok(shallow.seal());
    }
    let is_array = matches!(shallow, Shallow::Array(_));
    let applied = match edit {
        Edit::Add(v) => match &key {
            // Array adds are splices.
            Key::Index(i) if is_array => shallow.insert_at(*i, (*v).clone()),
            _ => shallow.set(&key, (*v).clone()),
        },
        Edit::Replace(v) => {
            if is_array && matches!(&key, Key::Index(i) if *i >= shallow.len()) {
                false
            } else {
                shallow.set(&key, (*v).clone())
            }
        }
        Edit::Remove(member) => match &key {
            Key::Index(i) if is_array => shallow.remove_at(*i).is_some(),
            // A recorded set member is authoritative over the path key.
            _ => match (matches!(shallow, Shallow::Set(_)), member) {
                (true, Some(m)) => shallow.delete(&Key::Item((*m).clone())).is_some(),
                _ => shallow.delete(&key).is_some(),
            },
        },
    };
    if !applied {
        return Err(missing(full));
    }
    Ok(shallow.seal())
}

// ── Draft application ─────────────────────────────────────────────────────

/// Apply one op by walking the path from `root`, drafting intermediate
/// containers. An op with an empty path cannot be applied to a draft in
/// place and fails.
pub(crate) fn apply_to_draft(root: &Draft, op: &PatchOp) -> DraftResult<()> {
    let path = op.path();
    if path.is_empty() {
        return Err(missing(path));
    }
    let mut cur = root.clone();
    let mut i = 0;
    while i + 1 < path.len() {
        let key = coerce(cur.archetype()?, &path[i]);
        if !fits(cur.archetype()?, &key) {
            return Err(missing(path));
        }
        match cur.get(key.clone())? {
            Some(DraftEntry::Draft(d)) => {
                cur = d;
                i += 1;
            }
            Some(DraftEntry::Value(v)) => {
                // Assigned subtree: plain data, edited functionally.
                let rebuilt = edit_at(&v, &path[i + 1..], path, &Edit::of(op))?;
                return cur.set(key, rebuilt);
            }
            None => return Err(missing(path)),
        }
    }
    let archetype = cur.archetype()?;
    let key = coerce(archetype, &path[i]);
    if !fits(archetype, &key) {
        return Err(missing(path));
    }
    match op {
        PatchOp::Add { value, .. } => match &key {
            Key::Index(idx) if archetype == Archetype::Array => {
                cur.insert_index(*idx, value.clone())
            }
            _ => cur.set(key, value.clone()),
        },
        PatchOp::Replace { value, .. } => {
            if let (Archetype::Array, Key::Index(idx)) = (archetype, &key) {
                if *idx >= cur.len()? {
                    return Err(missing(path));
                }
            }
            cur.set(key, value.clone())
        }
        PatchOp::Remove { value, .. } => match &key {
            Key::Index(idx) if archetype == Archetype::Array => {
                if *idx >= cur.len()? {
                    return Err(missing(path));
                }
                cur.remove_index(*idx).map(|_| ())
            }
            _ => {
                let key = match (archetype, value) {
                    (Archetype::Set, Some(member)) => Key::Item(member.clone()),
                    _ => key,
                };
                if !cur.has(key.clone())? {
                    return Err(missing(path));
                }
                cur.delete(key)
            }
        },
    }
}

impl Draft {
    /// Replay `patches` onto this draft, in order. Usable mid-recipe; the
    /// edits are recorded like any other draft mutation.
    pub fn apply(&self, patches: &[PatchOp]) -> DraftResult<()> {
        for op in patches {
            apply_to_draft(self, op)?;
        }
        Ok(())
    }
}

/// Apply `patches` to a plain value through an implicit scope, returning
/// the resulting value. The input is never mutated; untouched branches of
/// the result are shared with it.
pub fn apply_patches(base: &Value, patches: &[PatchOp]) -> DraftResult<Value> {
    let mut current = base.clone();
    let mut pending: Vec<&PatchOp> = Vec::new();
    for op in patches {
        if op.path().is_empty() {
            // Root-level op: earlier ops must still resolve, but their
            // result is superseded by the swapped-in document.
            flush(&current, &pending)?;
            pending.clear();
            current = match op {
                PatchOp::Replace { value, .. } | PatchOp::Add { value, .. } => value.clone(),
                PatchOp::Remove { path, .. } => return Err(missing(path)),
            };
        } else {
            pending.push(op);
        }
    }
    flush(&current, &pending)
}

fn flush(base: &Value, ops: &[&PatchOp]) -> DraftResult<Value> {
    if ops.is_empty() {
        return Ok(base.clone());
    }
    produce(base, |draft| {
        for op in ops {
            apply_to_draft(draft, op)?;
        }
        Ok(None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn keyed_ops() {
        let base = v(json!({"a": 1, "b": {"c": 2}}));
        let out = apply_patches(
            &base,
            &[
                PatchOp::Replace {
                    path: vec![Key::Field("b".into()), Key::Field("c".into())],
                    value: Value::Int(3),
                },
                PatchOp::Add {
                    path: vec![Key::Field("d".into())],
                    value: Value::Int(4),
                },
                PatchOp::Remove {
                    path: vec![Key::Field("a".into())],
                    value: None,
                },
            ],
        )
        .unwrap();
        assert_eq!(out, v(json!({"b": {"c": 3}, "d": 4})));
    }

    #[test]
    fn array_add_is_a_splice() {
        let base = v(json!([1, 3]));
        let out = apply_patches(
            &base,
            &[PatchOp::Add {
                path: vec![Key::Index(1)],
                value: Value::Int(2),
            }],
        )
        .unwrap();
        assert_eq!(out, v(json!([1, 2, 3])));
    }

    #[test]
    fn set_member_ops() {
        let base = Value::set([Value::Int(1), Value::Int(2)]);
        let out = apply_patches(
            &base,
            &[
                PatchOp::Remove {
                    path: vec![Key::Item(Value::Int(1))],
                    value: Some(Value::Int(1)),
                },
                PatchOp::Add {
                    path: vec![Key::Item(Value::Int(3))],
                    value: Value::Int(3),
                },
            ],
        )
        .unwrap();
        assert_eq!(out, Value::set([Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn root_replace() {
        let base = v(json!({"a": 1}));
        let next = v(json!([true]));
        let out = apply_patches(
            &base,
            &[PatchOp::Replace {
                path: vec![],
                value: next.clone(),
            }],
        )
        .unwrap();
        assert!(out.ptr_eq(&next));
    }

    #[test]
    fn ops_straddling_a_root_replace() {
        let base = v(json!({"a": 1}));
        let out = apply_patches(
            &base,
            &[
                PatchOp::Replace {
                    path: vec![Key::Field("a".into())],
                    value: Value::Int(2),
                },
                PatchOp::Replace {
                    path: vec![],
                    value: v(json!({"b": 0})),
                },
                PatchOp::Replace {
                    path: vec![Key::Field("b".into())],
                    value: Value::Int(9),
                },
            ],
        )
        .unwrap();
        assert_eq!(out, v(json!({"b": 9})));
    }

    #[test]
    fn unresolvable_op_before_a_root_swap_still_fails() {
        let base = v(json!({"a": 1}));
        let err = apply_patches(
            &base,
            &[
                PatchOp::Remove {
                    path: vec![Key::Field("nope".into())],
                    value: None,
                },
                PatchOp::Replace {
                    path: vec![],
                    value: v(json!({"b": 0})),
                },
            ],
        )
        .unwrap_err();
        assert_eq!(err, DraftError::PatchPathNotFound("/nope".into()));
    }

    #[test]
    fn unresolved_path_fails() {
        let base = v(json!({"a": 1}));
        let err = apply_patches(
            &base,
            &[PatchOp::Replace {
                path: vec![Key::Field("x".into()), Key::Field("y".into())],
                value: Value::Null,
            }],
        )
        .unwrap_err();
        assert_eq!(err, DraftError::PatchPathNotFound("/x/y".into()));
        let err = apply_patches(
            &base,
            &[PatchOp::Replace {
                path: vec![Key::Index(0)],
                value: Value::Null,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, DraftError::PatchPathNotFound(_)));
    }

    #[test]
    fn failed_application_touches_nothing() {
        let base = v(json!({"a": 1}));
        let result = apply_patches(
            &base,
            &[
                PatchOp::Replace {
                    path: vec![Key::Field("a".into())],
                    value: Value::Int(2),
                },
                PatchOp::Remove {
                    path: vec![Key::Field("nope".into())],
                    value: None,
                },
            ],
        );
        assert!(result.is_err());
        assert_eq!(base, v(json!({"a": 1})));
    }

    #[test]
    fn untouched_branches_stay_shared() {
        let base = v(json!({"hit": {"x": 1}, "miss": {"y": 2}}));
        let out = apply_patches(
            &base,
            &[PatchOp::Replace {
                path: vec![Key::Field("hit".into()), Key::Field("x".into())],
                value: Value::Int(9),
            }],
        )
        .unwrap();
        assert!(out.get("miss").unwrap().ptr_eq(base.get("miss").unwrap()));
    }

    #[test]
    fn apply_into_an_assigned_subtree() {
        let base = v(json!({"a": {"x": 1}}));
        let out = produce(&base, |draft| {
            draft.set("a", v(json!({"plain": {"n": 0}})))?;
            draft.apply(&[PatchOp::Replace {
                path: vec![
                    Key::Field("a".into()),
                    Key::Field("plain".into()),
                    Key::Field("n".into()),
                ],
                value: Value::Int(7),
            }])?;
            Ok(None)
        })
        .unwrap();
        assert_eq!(out, v(json!({"a": {"plain": {"n": 7}}})));
    }
}
