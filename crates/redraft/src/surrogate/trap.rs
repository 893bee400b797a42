//! Lazy interception: each operation is forwarded to the node as it occurs.

use redraft_value::{Key, Value};

use crate::error::DraftResult;
use crate::node::{self, NodeId, ReadSlot};
use crate::scope::ScopeInner;

use super::SurrogateStrategy;

pub(crate) struct TrapSurrogate;

impl SurrogateStrategy for TrapSurrogate {
    fn get(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<ReadSlot> {
        node::read_key(scope, id, key)
    }

    fn set(&self, scope: &ScopeInner, id: NodeId, key: Key, value: Value) -> DraftResult<()> {
        node::write_key(scope, id, key, value)
    }

    fn delete(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<()> {
        node::delete_key(scope, id, key)
    }

    fn has(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> bool {
        node::has_key(scope, id, key)
    }

    fn keys(&self, scope: &ScopeInner, id: NodeId) -> Vec<Key> {
        node::keys(scope, id)
    }

    fn len(&self, scope: &ScopeInner, id: NodeId) -> usize {
        node::len(scope, id)
    }
}
