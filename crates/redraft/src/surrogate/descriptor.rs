//! Eager interception via a per-node accessor table.
//!
//! When a node is created under this strategy it records every key present
//! in its base (arrays excepted, whose accessors are the index range). Keyed
//! reads consult the table first; a successful write of a previously unknown
//! key installs an accessor for it, and a deletion retires one. The table
//! therefore always mirrors the node's current key set, which keeps this
//! strategy observably identical to the trap strategy.

use redraft_value::{Key, Value};

use crate::error::DraftResult;
use crate::node::{self, NodeId, ReadSlot};
use crate::scope::ScopeInner;

use super::SurrogateStrategy;

pub(crate) struct DescriptorSurrogate;

fn known(scope: &ScopeInner, id: NodeId, key: &Key) -> bool {
    let nodes = scope.nodes.borrow();
    match &nodes[id].accessors {
        Some(table) => table.contains(key),
        // Arrays carry no table; index accessors are implicit.
        None => true,
    }
}

impl SurrogateStrategy for DescriptorSurrogate {
    fn get(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<ReadSlot> {
        if !known(scope, id, key) {
            return Ok(ReadSlot::Missing);
        }
        node::read_key(scope, id, key)
    }

    fn set(&self, scope: &ScopeInner, id: NodeId, key: Key, value: Value) -> DraftResult<()> {
        node::write_key(scope, id, key.clone(), value)?;
        // Install the accessor only once the write has landed.
        let mut nodes = scope.nodes.borrow_mut();
        if let Some(table) = nodes[id].accessors.as_mut() {
            table.insert(key);
        }
        Ok(())
    }

    fn delete(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<()> {
        node::delete_key(scope, id, key)?;
        let mut nodes = scope.nodes.borrow_mut();
        if let Some(table) = nodes[id].accessors.as_mut() {
            table.shift_remove(key);
        }
        Ok(())
    }

    fn has(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> bool {
        known(scope, id, key) && node::has_key(scope, id, key)
    }

    fn keys(&self, scope: &ScopeInner, id: NodeId) -> Vec<Key> {
        {
            let nodes = scope.nodes.borrow();
            if let Some(table) = &nodes[id].accessors {
                return table.iter().cloned().collect();
            }
        }
        node::keys(scope, id)
    }

    fn len(&self, scope: &ScopeInner, id: NodeId) -> usize {
        node::len(scope, id)
    }
}
