//! Patch generation from a finalized scope.
//!
//! Walks the arena in creation order (parents precede their children) and
//! diffs each modified node's base against its finalized value, scoped to
//! the keys the recipe actually touched. A node contributes nothing when its
//! slot in the parent was itself added or removed, when it was detached from
//! the registry, or when any ancestor is a set: in each of those cases the
//! ancestor's own op already carries the whole subtree.

use redraft_value::{Archetype, Key, Path, Value};

use crate::node::{Assign, NodeId};
use crate::scope::ScopeInner;

use super::types::{PatchOp, Patches};

/// Address of a node in the finalized result, or `None` when the node's
/// changes are covered by an ancestor op.
fn node_path(scope: &ScopeInner, id: NodeId) -> Option<Path> {
    let nodes = scope.nodes.borrow();
    let mut rev: Vec<Key> = Vec::new();
    let mut cur = id;
    loop {
        let Some((parent, key)) = &nodes[cur].parent else {
            break;
        };
        let p = &nodes[*parent];
        if p.children.get(key) != Some(&cur) {
            return None;
        }
        if p.archetype == Archetype::Set {
            return None;
        }
        if matches!(
            p.assigned.get(key),
            Some(Assign::Added) | Some(Assign::Removed)
        ) {
            return None;
        }
        rev.push(key.clone());
        cur = *parent;
    }
    rev.reverse();
    Some(rev)
}

fn at(path: &Path, key: Key) -> Path {
    let mut p = path.clone();
    p.push(key);
    p
}

fn diff_keyed(
    path: &Path,
    base: &Value,
    done: &Value,
    assigned: &[(Key, Assign)],
    forward: &mut Patches,
    inverse: &mut Patches,
) {
    for (key, assign) in assigned {
        match assign {
            Assign::Visited => {}
            Assign::Added => {
                let Some(new) = done.get_key(key) else {
                    continue;
                };
                match base.get_key(key) {
                    // A later write may have restored the original
                    // reference; that is no net change.
                    Some(old) if old.ptr_eq(new) => {}
                    Some(old) => {
                        forward.push(PatchOp::Replace {
                            path: at(path, key.clone()),
                            value: new.clone(),
                        });
                        inverse.push(PatchOp::Replace {
                            path: at(path, key.clone()),
                            value: old.clone(),
                        });
                    }
                    None => {
                        forward.push(PatchOp::Add {
                            path: at(path, key.clone()),
                            value: new.clone(),
                        });
                        inverse.push(PatchOp::Remove {
                            path: at(path, key.clone()),
                            value: None,
                        });
                    }
                }
            }
            Assign::Removed => {
                let Some(old) = base.get_key(key) else {
                    continue;
                };
                forward.push(PatchOp::Remove {
                    path: at(path, key.clone()),
                    value: None,
                });
                inverse.push(PatchOp::Add {
                    path: at(path, key.clone()),
                    value: old.clone(),
                });
            }
        }
    }
}

fn diff_array(
    path: &Path,
    base: &Value,
    done: &Value,
    assigned: &[(Key, Assign)],
    forward: &mut Patches,
    inverse: &mut Patches,
) {
    let base_len = base.len_of().unwrap_or(0);
    let done_len = done.len_of().unwrap_or(0);
    let common = base_len.min(done_len);
    for i in 0..common {
        let touched = assigned
            .iter()
            .any(|(k, a)| *k == Key::Index(i) && *a == Assign::Added);
        if !touched {
            continue;
        }
        let (Some(old), Some(new)) = (base.index(i), done.index(i)) else {
            continue;
        };
        if old.ptr_eq(new) {
            continue;
        }
        forward.push(PatchOp::Replace {
            path: at(path, Key::Index(i)),
            value: new.clone(),
        });
        inverse.push(PatchOp::Replace {
            path: at(path, Key::Index(i)),
            value: old.clone(),
        });
    }
    if done_len > base_len {
        // Extension: adds ascending; the inverse removes from the tail down.
        for i in base_len..done_len {
            if let Some(new) = done.index(i) {
                forward.push(PatchOp::Add {
                    path: at(path, Key::Index(i)),
                    value: new.clone(),
                });
            }
        }
        for i in (base_len..done_len).rev() {
            inverse.push(PatchOp::Remove {
                path: at(path, Key::Index(i)),
                value: None,
            });
        }
    } else if done_len < base_len {
        // Truncation: removes from the tail down so earlier indexes stay
        // valid; the inverse re-adds ascending.
        for i in (done_len..base_len).rev() {
            forward.push(PatchOp::Remove {
                path: at(path, Key::Index(i)),
                value: None,
            });
        }
        for i in done_len..base_len {
            if let Some(old) = base.index(i) {
                inverse.push(PatchOp::Add {
                    path: at(path, Key::Index(i)),
                    value: old.clone(),
                });
            }
        }
    }
}

fn diff_set(path: &Path, base: &Value, done: &Value, forward: &mut Patches, inverse: &mut Patches) {
    let (Some(old), Some(new)) = (base.as_set(), done.as_set()) else {
        return;
    };
    // Removals first so replaying never sees both members at once.
    for member in old.iter().filter(|m| !new.contains(*m)) {
        forward.push(PatchOp::Remove {
            path: at(path, Key::Item(member.clone())),
            value: Some(member.clone()),
        });
        inverse.push(PatchOp::Add {
            path: at(path, Key::Item(member.clone())),
            value: member.clone(),
        });
    }
    for member in new.iter().filter(|m| !old.contains(*m)) {
        forward.push(PatchOp::Add {
            path: at(path, Key::Item(member.clone())),
            value: member.clone(),
        });
        inverse.push(PatchOp::Remove {
            path: at(path, Key::Item(member.clone())),
            value: Some(member.clone()),
        });
    }
}

/// Diff every modified, finalized node against its base.
pub(crate) fn generate_patches(scope: &ScopeInner) -> (Patches, Patches) {
    let mut forward = Patches::new();
    let mut inverse = Patches::new();
    let count = scope.nodes.borrow().len();
    for id in 0..count {
        let Some((archetype, base, done, assigned)) = ({
            let nodes = scope.nodes.borrow();
            let node = &nodes[id];
            match &node.finalized {
                Some(done) if node.modified => Some((
                    node.archetype,
                    node.base.clone(),
                    done.clone(),
                    node.assigned
                        .iter()
                        .map(|(k, &a)| (k.clone(), a))
                        .collect::<Vec<_>>(),
                )),
                _ => None,
            }
        }) else {
            continue;
        };
        let Some(path) = node_path(scope, id) else {
            continue;
        };
        match archetype {
            Archetype::Object | Archetype::Map => {
                diff_keyed(&path, &base, &done, &assigned, &mut forward, &mut inverse)
            }
            Archetype::Array => {
                diff_array(&path, &base, &done, &assigned, &mut forward, &mut inverse)
            }
            Archetype::Set => diff_set(&path, &base, &done, &mut forward, &mut inverse),
            Archetype::NotDraftable => {}
        }
    }
    (forward, inverse)
}

/// Patches for a recipe that returned a wholesale replacement value.
pub(crate) fn replacement_patches(base: &Value, replacement: &Value) -> (Patches, Patches) {
    if replacement.ptr_eq(base) {
        return (Patches::new(), Patches::new());
    }
    (
        vec![PatchOp::Replace {
            path: Vec::new(),
            value: replacement.clone(),
        }],
        vec![PatchOp::Replace {
            path: Vec::new(),
            value: base.clone(),
        }],
    )
}
