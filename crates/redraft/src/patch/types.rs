//! Patch operation wire types.

use serde::{Deserialize, Serialize};

use redraft_value::{format_path, Path, Value};

/// One recorded mutation.
///
/// Paths address the value the op applies to: object fields and map keys by
/// key, array elements by position, set members by the member itself. An
/// empty path addresses the root. `Remove` carries the removed set member in
/// `value` so the op is self-contained on the wire; for other archetypes the
/// field is absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    Add {
        path: Path,
        value: Value,
    },
    Replace {
        path: Path,
        value: Value,
    },
    Remove {
        path: Path,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
}

/// A forward or inverse patch list, in application order.
pub type Patches = Vec<PatchOp>;

impl PatchOp {
    pub fn path(&self) -> &Path {
        match self {
            PatchOp::Add { path, .. } => path,
            PatchOp::Replace { path, .. } => path,
            PatchOp::Remove { path, .. } => path,
        }
    }

    /// The path rendered in `/a/0/b` form, `/` for the root.
    pub fn path_string(&self) -> String {
        format_path(self.path())
    }
}
