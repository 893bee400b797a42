//! Draft node state machine.
//!
//! One `NodeState` exists per surrogate created during a scope, held in the
//! scope's arena in creation order. A node wraps an immutable `base`
//! sub-value; the first write materializes `copy`, a mutable shallow
//! duplicate, and every later edit lands there. `base` is never touched.
//!
//! Child drafts are registered per key so re-reading a key yields the same
//! draft (identity stability), and the `modified` flag propagates upward
//! through the non-owning parent back-links the moment a node changes.

use indexmap::{IndexMap, IndexSet};

use redraft_value::{archetype_of, is_draftable, Archetype, Key, Shallow, Value};

use crate::error::{DraftError, DraftResult};
use crate::scope::ScopeInner;
use crate::surrogate::SurrogateKind;

pub(crate) type NodeId = usize;

/// Tri-state flag for a key touched during the recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Assign {
    /// The key was written with a new value (or re-pointed by a splice).
    Added,
    /// The key existed in `base` and was deleted.
    Removed,
    /// The key was touched but its value did not change.
    Visited,
}

#[derive(Debug)]
pub(crate) struct NodeState {
    /// The original sub-value this node wraps. Never mutated.
    pub(crate) base: Value,
    pub(crate) archetype: Archetype,
    /// Lazily-created mutable shallow duplicate; absent means "unmodified".
    /// Once created it is edited in place for the rest of the scope.
    pub(crate) copy: Option<Shallow>,
    /// Non-owning back-link for upward `modified` propagation.
    pub(crate) parent: Option<(NodeId, Key)>,
    pub(crate) assigned: IndexMap<Key, Assign>,
    /// Key → child draft, created at most once per key. For arrays the keys
    /// are remapped on splices so they track the element they were made for.
    pub(crate) children: IndexMap<Key, NodeId>,
    pub(crate) modified: bool,
    /// Finalized result, set exactly once when the scope closes.
    pub(crate) finalized: Option<Value>,
    /// Descriptor-surrogate accessor table; `None` under the trap surrogate
    /// and for arrays, whose accessors are the index range.
    pub(crate) accessors: Option<IndexSet<Key>>,
}

impl NodeState {
    fn new(base: Value, parent: Option<(NodeId, Key)>, kind: SurrogateKind) -> NodeState {
        let archetype = archetype_of(&base);
        let accessors = match kind {
            SurrogateKind::Descriptor if archetype != Archetype::Array => {
                Some(base.keys().into_iter().collect())
            }
            _ => None,
        };
        NodeState {
            base,
            archetype,
            copy: None,
            parent,
            assigned: IndexMap::new(),
            children: IndexMap::new(),
            modified: false,
            finalized: None,
            accessors,
        }
    }
}

/// Append a node to the arena. The caller guarantees `base` is draftable.
pub(crate) fn push_node(
    nodes: &mut Vec<NodeState>,
    kind: SurrogateKind,
    base: Value,
    parent: Option<(NodeId, Key)>,
) -> NodeId {
    let id = nodes.len();
    nodes.push(NodeState::new(base, parent, kind));
    id
}

/// The value currently visible at `key`: `copy` wins over `base`.
fn current_of<'a>(node: &'a NodeState, key: &Key) -> Option<&'a Value> {
    match &node.copy {
        Some(copy) => copy.get(key),
        None => node.base.get_key(key),
    }
}

fn ensure_copy(node: &mut NodeState) {
    if node.copy.is_none() {
        node.copy = Shallow::of(&node.base);
    }
}

fn check_key_kind(archetype: Archetype, key: &Key, op: &'static str) -> DraftResult<()> {
    let ok = matches!(
        (archetype, key),
        (Archetype::Object, Key::Field(_))
            | (Archetype::Array, Key::Index(_))
            | (Archetype::Map, Key::Item(_))
            | (Archetype::Set, Key::Item(_))
    );
    if ok {
        Ok(())
    } else {
        Err(DraftError::UnsupportedArchetype { op, archetype })
    }
}

/// Monotonic upward propagation of the modified flag. Stops at the first
/// ancestor already marked, since everything above it is marked too.
pub(crate) fn mark_changed(scope: &ScopeInner, id: NodeId) {
    let mut nodes = scope.nodes.borrow_mut();
    let mut cur = Some(id);
    while let Some(i) = cur {
        if nodes[i].modified {
            break;
        }
        nodes[i].modified = true;
        cur = nodes[i].parent.as_ref().map(|(p, _)| *p);
    }
}

/// Outcome of reading one key of a node.
pub(crate) enum ReadSlot {
    Missing,
    /// A primitive, or a value assigned during the recipe: returned as-is.
    Plain(Value),
    /// A draftable base-derived value: the memoized child draft.
    Child(NodeId),
}

pub(crate) fn read_key(scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<ReadSlot> {
    let mut nodes = scope.nodes.borrow_mut();
    if let Some(&child) = nodes[id].children.get(key) {
        return Ok(ReadSlot::Child(child));
    }
    let node = &nodes[id];
    let assigned_here = matches!(node.assigned.get(key), Some(Assign::Added));
    let Some(value) = current_of(node, key).cloned() else {
        return Ok(ReadSlot::Missing);
    };
    if assigned_here || !is_draftable(&value) {
        return Ok(ReadSlot::Plain(value));
    }
    // First draftable read of a base-derived slot: memoize a child node.
    let kind = scope.kind;
    let child = push_node(&mut nodes, kind, value, Some((id, key.clone())));
    nodes[id].children.insert(key.clone(), child);
    Ok(ReadSlot::Child(child))
}

pub(crate) fn write_key(scope: &ScopeInner, id: NodeId, key: Key, value: Value) -> DraftResult<()> {
    {
        let mut nodes = scope.nodes.borrow_mut();
        let node = &mut nodes[id];
        check_key_kind(node.archetype, &key, "set")?;

        if node.archetype == Archetype::Set {
            // Membership add; the key is the member itself.
            if current_of(node, &key).is_some() {
                if !node.assigned.contains_key(&key) {
                    node.assigned.insert(key, Assign::Visited);
                }
                return Ok(());
            }
        } else {
            if let Key::Index(i) = &key {
                let len = node
                    .copy
                    .as_ref()
                    .map(Shallow::len)
                    .or_else(|| node.base.len_of())
                    .unwrap_or(0);
                if *i > len {
                    return Err(DraftError::IndexOutOfBounds { index: *i, len });
                }
            }
            // Write elision: assigning the same reference marks the key
            // visited but does not count as a modification.
            let elide = current_of(node, &key).is_some_and(|cur| value.ptr_eq(cur));
            if elide {
                if !node.assigned.contains_key(&key) {
                    node.assigned.insert(key, Assign::Visited);
                }
                return Ok(());
            }
        }

        ensure_copy(node);
        let Some(copy) = node.copy.as_mut() else {
            return Err(DraftError::UnsupportedArchetype {
                op: "set",
                archetype: node.archetype,
            });
        };
        copy.set(&key, value);
        node.children.shift_remove(&key);
        node.assigned.insert(key, Assign::Added);
    }
    mark_changed(scope, id);
    Ok(())
}

pub(crate) fn delete_key(scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<()> {
    {
        let mut nodes = scope.nodes.borrow_mut();
        let node = &mut nodes[id];
        if node.archetype == Archetype::Array {
            // Array positions are removed by splicing, not keyed deletion.
            return Err(DraftError::UnsupportedArchetype {
                op: "delete",
                archetype: node.archetype,
            });
        }
        check_key_kind(node.archetype, key, "delete")?;
        if current_of(node, key).is_none() {
            return Ok(());
        }
        ensure_copy(node);
        if let Some(copy) = node.copy.as_mut() {
            copy.delete(key);
        }
        if node.base.has_key(key) {
            node.assigned.insert(key.clone(), Assign::Removed);
        } else {
            node.assigned.shift_remove(key);
        }
        node.children.shift_remove(key);
    }
    mark_changed(scope, id);
    Ok(())
}

pub(crate) fn has_key(scope: &ScopeInner, id: NodeId, key: &Key) -> bool {
    let nodes = scope.nodes.borrow();
    current_of(&nodes[id], key).is_some()
}

pub(crate) fn keys(scope: &ScopeInner, id: NodeId) -> Vec<Key> {
    let nodes = scope.nodes.borrow();
    let node = &nodes[id];
    match &node.copy {
        Some(copy) => copy.keys(),
        None => node.base.keys(),
    }
}

pub(crate) fn len(scope: &ScopeInner, id: NodeId) -> usize {
    let nodes = scope.nodes.borrow();
    let node = &nodes[id];
    match &node.copy {
        Some(copy) => copy.len(),
        None => node.base.len_of().unwrap_or(0),
    }
}

/// Array splice: insert `value` at `index`, shifting later elements right.
///
/// Registered children at shifted positions follow their element, and every
/// shifted index is marked assigned so the patch generator diffs it
/// positionally.
pub(crate) fn splice_insert(
    scope: &ScopeInner,
    id: NodeId,
    index: usize,
    value: Value,
) -> DraftResult<()> {
    {
        let mut nodes = scope.nodes.borrow_mut();
        let node = &mut nodes[id];
        if node.archetype != Archetype::Array {
            return Err(DraftError::UnsupportedArchetype {
                op: "insert_index",
                archetype: node.archetype,
            });
        }
        ensure_copy(node);
        let Some(copy) = node.copy.as_mut() else {
            return Err(DraftError::UnsupportedArchetype {
                op: "insert_index",
                archetype: node.archetype,
            });
        };
        let len = copy.len();
        if !copy.insert_at(index, value) {
            return Err(DraftError::IndexOutOfBounds { index, len });
        }
        let remapped: Vec<(Key, NodeId)> = node
            .children
            .iter()
            .map(|(k, &c)| match k {
                Key::Index(i) if *i >= index => (Key::Index(i + 1), c),
                _ => (k.clone(), c),
            })
            .collect();
        node.children = remapped.iter().cloned().collect();
        for i in index..len + 1 {
            node.assigned.insert(Key::Index(i), Assign::Added);
        }
        for (k, c) in remapped {
            if let Some(p) = nodes[c].parent.as_mut() {
                p.1 = k;
            }
        }
    }
    mark_changed(scope, id);
    Ok(())
}

/// Array splice: remove the element at `index`, shifting later elements left.
pub(crate) fn splice_remove(scope: &ScopeInner, id: NodeId, index: usize) -> DraftResult<Value> {
    let removed = {
        let mut nodes = scope.nodes.borrow_mut();
        let node = &mut nodes[id];
        if node.archetype != Archetype::Array {
            return Err(DraftError::UnsupportedArchetype {
                op: "remove_index",
                archetype: node.archetype,
            });
        }
        ensure_copy(node);
        let Some(copy) = node.copy.as_mut() else {
            return Err(DraftError::UnsupportedArchetype {
                op: "remove_index",
                archetype: node.archetype,
            });
        };
        let len = copy.len();
        let Some(removed) = copy.remove_at(index) else {
            return Err(DraftError::IndexOutOfBounds { index, len });
        };
        let remapped: Vec<(Key, NodeId)> = node
            .children
            .iter()
            .filter_map(|(k, &c)| match k {
                Key::Index(i) if *i == index => None,
                Key::Index(i) if *i > index => Some((Key::Index(i - 1), c)),
                _ => Some((k.clone(), c)),
            })
            .collect();
        node.children = remapped.iter().cloned().collect();
        for i in index..len - 1 {
            node.assigned.insert(Key::Index(i), Assign::Added);
        }
        for (k, c) in remapped {
            if let Some(p) = nodes[c].parent.as_mut() {
                p.1 = k;
            }
        }
        removed
    };
    mark_changed(scope, id);
    Ok(removed)
}

/// Substitute a resolved child value into its slot, reusing the existing
/// reference when nothing actually changed.
pub(crate) fn substitute(shallow: &mut Shallow, key: &Key, resolved: Value) {
    if let (Archetype::Set, Key::Item(original)) = (shallow.archetype(), key) {
        if !resolved.ptr_eq(original) {
            shallow.replace_item(original, resolved);
        }
        return;
    }
    if let Some(current) = shallow.get(key) {
        if !resolved.ptr_eq(current) {
            shallow.set(key, resolved);
        }
    }
}

/// The current resolved value of a node, child drafts included, without
/// finalizing anything. Unmodified nodes resolve to `base` by reference.
pub(crate) fn snapshot(scope: &ScopeInner, id: NodeId) -> Value {
    let (base, copy, children) = {
        let nodes = scope.nodes.borrow();
        let node = &nodes[id];
        if !node.modified {
            return node.base.clone();
        }
        (node.base.clone(), node.copy.clone(), node.children.clone())
    };
    let Some(mut shallow) = copy.or_else(|| Shallow::of(&base)) else {
        return base;
    };
    for (key, child) in children {
        let resolved = snapshot(scope, child);
        substitute(&mut shallow, &key, resolved);
    }
    shallow.seal()
}
