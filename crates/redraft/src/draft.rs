//! The draft handle: the mutable-looking view a recipe works against.
//!
//! A [`Draft`] is a cheap, cloneable handle onto one node of a live scope.
//! All operations go through the scope's surrogate strategy and fail with
//! [`DraftError::UsedAfterFinalize`] once the scope has closed. Reading a
//! nested container yields another `Draft` for the same scope, and reading
//! the same key twice yields a handle to the same underlying node.

use std::rc::Rc;

use redraft_value::{Archetype, Key, Value};

use crate::error::{DraftError, DraftResult};
use crate::node::{self, NodeId, ReadSlot};
use crate::scope::ScopeInner;
use crate::surrogate::{strategy_for, SurrogateStrategy};

/// Handle onto one draft node. Clones refer to the same node.
#[derive(Clone)]
pub struct Draft {
    pub(crate) scope: Rc<ScopeInner>,
    pub(crate) node: NodeId,
}

/// What a keyed read produced: a plain value, or a nested draft.
#[derive(Debug)]
pub enum DraftEntry {
    Value(Value),
    Draft(Draft),
}

impl DraftEntry {
    /// The nested draft, or `UnsupportedArchetype` for a plain value.
    pub fn into_draft(self) -> DraftResult<Draft> {
        match self {
            DraftEntry::Draft(d) => Ok(d),
            DraftEntry::Value(v) => Err(DraftError::UnsupportedArchetype {
                op: "draft",
                archetype: redraft_value::archetype_of(&v),
            }),
        }
    }

    /// The current value of the entry, resolving a nested draft.
    pub fn value(&self) -> DraftResult<Value> {
        match self {
            DraftEntry::Value(v) => Ok(v.clone()),
            DraftEntry::Draft(d) => d.snapshot(),
        }
    }
}

impl Draft {
    pub(crate) fn new(scope: Rc<ScopeInner>, node: NodeId) -> Draft {
        Draft { scope, node }
    }

    fn strategy(&self) -> &'static dyn SurrogateStrategy {
        strategy_for(self.scope.kind)
    }

    /// The container shape of this node.
    pub fn archetype(&self) -> DraftResult<Archetype> {
        self.scope.check_live()?;
        Ok(self.scope.nodes.borrow()[self.node].archetype)
    }

    /// Read the entry at `key`. Draftable base-derived values come back as
    /// nested drafts; everything else comes back as a plain value.
    pub fn get(&self, key: impl Into<Key>) -> DraftResult<Option<DraftEntry>> {
        self.scope.check_live()?;
        let key = key.into();
        match self.strategy().get(&self.scope, self.node, &key)? {
            ReadSlot::Missing => Ok(None),
            ReadSlot::Plain(v) => Ok(Some(DraftEntry::Value(v))),
            ReadSlot::Child(child) => Ok(Some(DraftEntry::Draft(Draft::new(
                Rc::clone(&self.scope),
                child,
            )))),
        }
    }

    /// Read the entry at `key` as a nested draft.
    pub fn get_draft(&self, key: impl Into<Key>) -> DraftResult<Draft> {
        let key = key.into();
        match self.get(key.clone())? {
            Some(entry) => entry.into_draft(),
            None => Err(DraftError::PatchPathNotFound(key.to_string())),
        }
    }

    /// The current value at `key`, resolving nested drafts.
    pub fn get_value(&self, key: impl Into<Key>) -> DraftResult<Option<Value>> {
        match self.get(key)? {
            Some(entry) => Ok(Some(entry.value()?)),
            None => Ok(None),
        }
    }

    /// Write `value` at `key`. Assigning the value already present is a
    /// no-op that does not mark the draft modified.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> DraftResult<()> {
        self.scope.check_live()?;
        self.strategy()
            .set(&self.scope, self.node, key.into(), value.into())
    }

    /// Delete the entry at `key`. Deleting an absent key is a no-op.
    pub fn delete(&self, key: impl Into<Key>) -> DraftResult<()> {
        self.scope.check_live()?;
        self.strategy().delete(&self.scope, self.node, &key.into())
    }

    pub fn has(&self, key: impl Into<Key>) -> DraftResult<bool> {
        self.scope.check_live()?;
        Ok(self.strategy().has(&self.scope, self.node, &key.into()))
    }

    /// Current keys in container order.
    pub fn keys(&self) -> DraftResult<Vec<Key>> {
        self.scope.check_live()?;
        Ok(self.strategy().keys(&self.scope, self.node))
    }

    pub fn len(&self) -> DraftResult<usize> {
        self.scope.check_live()?;
        Ok(self.strategy().len(&self.scope, self.node))
    }

    pub fn is_empty(&self) -> DraftResult<bool> {
        Ok(self.len()? == 0)
    }

    // ── Array splices ─────────────────────────────────────────────────────

    /// Insert into an array at `index`, shifting later elements right.
    pub fn insert_index(&self, index: usize, value: impl Into<Value>) -> DraftResult<()> {
        self.scope.check_live()?;
        node::splice_insert(&self.scope, self.node, index, value.into())
    }

    /// Remove an array element at `index`, shifting later elements left.
    pub fn remove_index(&self, index: usize) -> DraftResult<Value> {
        self.scope.check_live()?;
        node::splice_remove(&self.scope, self.node, index)
    }

    /// Append to the end of an array.
    pub fn push(&self, value: impl Into<Value>) -> DraftResult<()> {
        let len = self.len()?;
        self.set(Key::Index(len), value)
    }

    // ── Set membership ────────────────────────────────────────────────────

    /// Add a member to a set. Adding a member already present is a no-op.
    pub fn add(&self, member: impl Into<Value>) -> DraftResult<()> {
        let member = member.into();
        self.set(Key::Item(member.clone()), member)
    }

    /// Remove a member from a set.
    pub fn remove(&self, member: impl Into<Value>) -> DraftResult<()> {
        self.delete(Key::Item(member.into()))
    }

    /// Whether the set contains `member`.
    pub fn contains(&self, member: impl Into<Value>) -> DraftResult<bool> {
        self.has(Key::Item(member.into()))
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Whether this node (or anything beneath it) has been modified.
    pub fn is_modified(&self) -> DraftResult<bool> {
        self.scope.check_live()?;
        Ok(self.scope.nodes.borrow()[self.node].modified)
    }

    /// The current value of this draft, child edits included, without
    /// closing the scope. Unmodified subtrees are returned by reference.
    pub fn snapshot(&self) -> DraftResult<Value> {
        self.scope.check_live()?;
        Ok(node::snapshot(&self.scope, self.node))
    }
}

impl std::fmt::Debug for Draft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scope.revoked.get() {
            return f.write_str("Draft(<revoked>)");
        }
        f.debug_struct("Draft")
            .field("node", &self.node)
            .field("modified", &self.scope.nodes.borrow()[self.node].modified)
            .finish()
    }
}
