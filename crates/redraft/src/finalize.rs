//! Scope finalization: fold the draft tree back into an immutable value.
//!
//! Runs post-order over the node arena. An unmodified node finalizes to its
//! `base` by reference, so every untouched subtree of the result is shared
//! with the input. A modified node seals its copy after substituting each
//! registered child's finalized value into its slot; substitution is skipped
//! when the child resolved to the same reference, so a child whose edits all
//! elided leaves the parent slot shared too.

use redraft_value::{Shallow, Value};

use crate::node::{substitute, NodeId};
use crate::scope::{ScopeInner, ROOT};

/// Finalize one node, memoizing the result in the arena. Children detached
/// from their parent's registry are never visited and stay unfinalized.
pub(crate) fn finalize_node(scope: &ScopeInner, id: NodeId) -> Value {
    let (base, copy, children) = {
        let nodes = scope.nodes.borrow();
        let node = &nodes[id];
        if let Some(done) = &node.finalized {
            return done.clone();
        }
        if !node.modified {
            (node.base.clone(), None, Vec::new())
        } else {
            (
                node.base.clone(),
                node.copy.clone(),
                node.children
                    .iter()
                    .map(|(k, &c)| (k.clone(), c))
                    .collect(),
            )
        }
    };
    let result = match copy.or_else(|| {
        if children.is_empty() {
            None
        } else {
            Shallow::of(&base)
        }
    }) {
        None => base,
        Some(mut shallow) => {
            for (key, child) in children {
                let resolved = finalize_node(scope, child);
                substitute(&mut shallow, &key, resolved);
            }
            shallow.seal()
        }
    };
    scope.nodes.borrow_mut()[id].finalized = Some(result.clone());
    result
}

pub(crate) fn finalize_root(scope: &ScopeInner) -> Value {
    finalize_node(scope, ROOT)
}
