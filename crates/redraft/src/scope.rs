//! Draft scopes: the unit of lifecycle for a produce call.
//!
//! A scope owns the arena of every node created while a recipe runs. Nodes
//! refer to each other by arena index, so the arena is the single owner and
//! parent links can stay non-owning. Closing the scope (commit or abort)
//! revokes it: any draft handle still alive turns into a dead reference that
//! fails with [`DraftError::UsedAfterFinalize`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use redraft_value::{archetype_of, Value};

use crate::error::{DraftError, DraftResult};
use crate::node::{self, NodeId, NodeState};
use crate::surrogate::SurrogateKind;

#[derive(Debug)]
pub(crate) struct ScopeInner {
    pub(crate) nodes: RefCell<Vec<NodeState>>,
    pub(crate) revoked: Cell<bool>,
    pub(crate) kind: SurrogateKind,
}

impl ScopeInner {
    /// Guard every draft operation. Handles outlive the scope freely, but
    /// using one afterwards is an error.
    pub(crate) fn check_live(&self) -> DraftResult<()> {
        if self.revoked.get() {
            Err(DraftError::UsedAfterFinalize)
        } else {
            Ok(())
        }
    }
}

/// A live draft scope. The root node is always arena slot zero.
#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) inner: Rc<ScopeInner>,
}

pub(crate) const ROOT: NodeId = 0;

impl Scope {
    /// Open a scope over `base`, which must be a container value.
    pub(crate) fn open(base: Value, kind: SurrogateKind) -> DraftResult<Scope> {
        let archetype = archetype_of(&base);
        if !archetype.is_draftable() {
            return Err(DraftError::UnsupportedArchetype {
                op: "draft",
                archetype,
            });
        }
        let inner = Rc::new(ScopeInner {
            nodes: RefCell::new(Vec::new()),
            revoked: Cell::new(false),
            kind,
        });
        let root = node::push_node(&mut inner.nodes.borrow_mut(), kind, base, None);
        debug_assert_eq!(root, ROOT);
        Ok(Scope { inner })
    }

    /// Close the scope so surviving handles can no longer touch the arena.
    pub(crate) fn revoke(&self) {
        self.inner.revoked.set(true);
    }

    pub(crate) fn root_modified(&self) -> bool {
        self.inner.nodes.borrow()[ROOT].modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_rejects_scalars() {
        let err = Scope::open(Value::Int(1), SurrogateKind::Trap).unwrap_err();
        assert!(matches!(err, DraftError::UnsupportedArchetype { op: "draft", .. }));
        assert!(Scope::open(Value::from(json!([])), SurrogateKind::Trap).is_ok());
    }

    #[test]
    fn revocation_blocks_access() {
        let scope = Scope::open(Value::from(json!({})), SurrogateKind::Trap).unwrap();
        assert!(scope.inner.check_live().is_ok());
        scope.revoke();
        assert_eq!(
            scope.inner.check_live().unwrap_err(),
            DraftError::UsedAfterFinalize
        );
    }
}
