//! Surrogate strategies: how a draft handle intercepts container access.
//!
//! Every read and write on a [`crate::Draft`] goes through one of two
//! interchangeable strategies. [`trap::TrapSurrogate`] intercepts each
//! operation lazily as it happens; [`descriptor::DescriptorSurrogate`]
//! enumerates a node's keys eagerly at creation and routes keyed access
//! through that table. Both produce identical observable behavior, so the
//! choice is a scope-wide option, fixed when the scope opens.

pub(crate) mod descriptor;
pub(crate) mod trap;

use redraft_value::{Key, Value};

use crate::error::DraftResult;
use crate::node::{NodeId, ReadSlot};
use crate::scope::ScopeInner;

/// Interception strategy for one scope. Implementations are stateless; all
/// per-node state lives in the arena.
pub(crate) trait SurrogateStrategy {
    fn get(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<ReadSlot>;
    fn set(&self, scope: &ScopeInner, id: NodeId, key: Key, value: Value) -> DraftResult<()>;
    fn delete(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> DraftResult<()>;
    fn has(&self, scope: &ScopeInner, id: NodeId, key: &Key) -> bool;
    fn keys(&self, scope: &ScopeInner, id: NodeId) -> Vec<Key>;
    fn len(&self, scope: &ScopeInner, id: NodeId) -> usize;
}

/// Which surrogate strategy a scope uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurrogateKind {
    /// Lazy per-operation interception.
    #[default]
    Trap,
    /// Eager per-key accessor table.
    Descriptor,
}

pub(crate) fn strategy_for(kind: SurrogateKind) -> &'static dyn SurrogateStrategy {
    match kind {
        SurrogateKind::Trap => &trap::TrapSurrogate,
        SurrogateKind::Descriptor => &descriptor::DescriptorSurrogate,
    }
}
