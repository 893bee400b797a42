//! The produce entry points.
//!
//! `produce` runs a recipe against a draft of `base` and returns the next
//! value. The recipe mutates the draft freely; if it returns `Some(value)`
//! instead, that value replaces the result wholesale (returning a
//! replacement after also mutating the draft is an error). When the recipe
//! fails, the scope is discarded and `base` is untouched, so a failed
//! produce has no observable effect.
//!
//! `create_draft`/`finish_draft` split the same lifecycle in two for callers
//! that mutate across several steps before committing.

use std::rc::Rc;

use redraft_value::Value;

use crate::draft::Draft;
use crate::error::{DraftError, DraftResult};
use crate::finalize::finalize_root;
use crate::patch::{generate_patches, replacement_patches, Patches};
use crate::scope::{Scope, ROOT};
use crate::surrogate::SurrogateKind;

/// Scope-wide options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Which surrogate strategy drafts of this scope use.
    pub surrogate: SurrogateKind,
}

/// A recipe's outcome: `None` commits the draft, `Some` replaces the result.
pub type Produced = Option<Value>;

/// Produce the next value from `base` by running `recipe` against a draft
/// of it. If nothing was changed the result is `base` itself, by reference.
pub fn produce<F>(base: &Value, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
{
    produce_in(base, Options::default(), recipe)
}

/// [`produce`] with explicit [`Options`].
pub fn produce_in<F>(base: &Value, options: Options, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
{
    let (value, _, _) = run(base, options, recipe, false)?;
    Ok(value)
}

/// [`produce`], also returning the forward and inverse patch lists.
pub fn produce_with_patches<F>(base: &Value, recipe: F) -> DraftResult<(Value, Patches, Patches)>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
{
    produce_with_patches_in(base, Options::default(), recipe)
}

/// [`produce_with_patches`] with explicit [`Options`].
pub fn produce_with_patches_in<F>(
    base: &Value,
    options: Options,
    recipe: F,
) -> DraftResult<(Value, Patches, Patches)>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
{
    run(base, options, recipe, true)
}

/// [`produce`] that hands the patch lists to `listener` after a successful
/// commit. A failed recipe never reaches the listener.
pub fn produce_with_listener<F, L>(base: &Value, recipe: F, mut listener: L) -> DraftResult<Value>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
    L: FnMut(&Patches, &Patches),
{
    let (value, forward, inverse) = run(base, Options::default(), recipe, true)?;
    listener(&forward, &inverse);
    Ok(value)
}

fn run<F>(
    base: &Value,
    options: Options,
    recipe: F,
    want_patches: bool,
) -> DraftResult<(Value, Patches, Patches)>
where
    F: FnOnce(&Draft) -> DraftResult<Produced>,
{
    let scope = Scope::open(base.clone(), options.surrogate)?;
    let root = Draft::new(Rc::clone(&scope.inner), ROOT);
    let replaced = match recipe(&root) {
        Ok(replaced) => replaced,
        Err(err) => {
            scope.revoke();
            return Err(err);
        }
    };
    let outcome = match replaced {
        Some(replacement) => {
            if scope.root_modified() {
                scope.revoke();
                return Err(DraftError::ReplacedAndMutated);
            }
            let (forward, inverse) = if want_patches {
                replacement_patches(base, &replacement)
            } else {
                (Patches::new(), Patches::new())
            };
            (replacement, forward, inverse)
        }
        None => {
            let value = finalize_root(&scope.inner);
            let (forward, inverse) = if want_patches {
                generate_patches(&scope.inner)
            } else {
                (Patches::new(), Patches::new())
            };
            (value, forward, inverse)
        }
    };
    scope.revoke();
    Ok(outcome)
}

// ── Split lifecycle ───────────────────────────────────────────────────────

/// Open a standalone draft of `base`. The scope stays alive until the draft
/// is passed to [`finish_draft`].
pub fn create_draft(base: &Value) -> DraftResult<Draft> {
    create_draft_in(base, Options::default())
}

/// [`create_draft`] with explicit [`Options`].
pub fn create_draft_in(base: &Value, options: Options) -> DraftResult<Draft> {
    let scope = Scope::open(base.clone(), options.surrogate)?;
    Ok(Draft::new(Rc::clone(&scope.inner), ROOT))
}

/// Commit a standalone draft, revoking its scope. Only the root draft of a
/// scope can be finished; handing in a nested draft is an error and leaves
/// the scope open.
pub fn finish_draft(draft: Draft) -> DraftResult<Value> {
    let (value, _, _) = finish(draft, false)?;
    Ok(value)
}

/// [`finish_draft`], also returning the forward and inverse patch lists.
pub fn finish_draft_with_patches(draft: Draft) -> DraftResult<(Value, Patches, Patches)> {
    finish(draft, true)
}

fn finish(draft: Draft, want_patches: bool) -> DraftResult<(Value, Patches, Patches)> {
    draft.scope.check_live()?;
    if draft.node != ROOT {
        return Err(DraftError::NestedDraftLeak);
    }
    let value = finalize_root(&draft.scope);
    let (forward, inverse) = if want_patches {
        generate_patches(&draft.scope)
    } else {
        (Patches::new(), Patches::new())
    };
    draft.scope.revoked.set(true);
    Ok((value, forward, inverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn untouched_recipe_returns_base_by_reference() {
        let base = v(json!({"a": [1, 2, 3]}));
        let out = produce(&base, |d| {
            let _ = d.get("a")?;
            Ok(None)
        })
        .unwrap();
        assert!(out.ptr_eq(&base));
    }

    #[test]
    fn failed_recipe_discards_everything() {
        let base = v(json!({"a": 1}));
        let mut kept: Option<Draft> = None;
        let err = produce(&base, |d| {
            d.set("a", 2i64)?;
            kept = Some(d.clone());
            Err(DraftError::PatchPathNotFound("boom".into()))
        })
        .unwrap_err();
        assert_eq!(err, DraftError::PatchPathNotFound("boom".into()));
        // The scope was revoked, so the leaked handle is dead.
        let kept = kept.unwrap();
        assert_eq!(kept.get("a").unwrap_err(), DraftError::UsedAfterFinalize);
    }

    #[test]
    fn listener_fires_only_on_success() {
        let base = v(json!({"n": 0}));
        let mut calls = 0usize;
        let out = produce_with_listener(
            &base,
            |d| {
                d.set("n", 1i64)?;
                Ok(None)
            },
            |forward, inverse| {
                calls += 1;
                assert_eq!(forward.len(), 1);
                assert_eq!(inverse.len(), 1);
            },
        )
        .unwrap();
        assert_eq!(out, v(json!({"n": 1})));
        assert_eq!(calls, 1);

        let mut fired = false;
        let _ = produce_with_listener(
            &base,
            |_| Err(DraftError::NestedDraftLeak),
            |_, _| fired = true,
        );
        assert!(!fired);
    }

    #[test]
    fn replacement_result() {
        let base = v(json!({"a": 1}));
        let (out, forward, inverse) = produce_with_patches(&base, |_| Ok(Some(v(json!(null)))))
            .unwrap();
        assert_eq!(out, Value::Null);
        assert_eq!(
            forward,
            vec![crate::PatchOp::Replace {
                path: vec![],
                value: Value::Null
            }]
        );
        assert_eq!(
            inverse,
            vec![crate::PatchOp::Replace {
                path: vec![],
                value: base.clone()
            }]
        );
    }

    #[test]
    fn replacement_identical_to_base_yields_no_patches() {
        let base = v(json!({"a": 1}));
        let (out, forward, inverse) =
            produce_with_patches(&base, |_| Ok(Some(base.clone()))).unwrap();
        assert!(out.ptr_eq(&base));
        assert!(forward.is_empty());
        assert!(inverse.is_empty());
    }

    #[test]
    fn replace_after_mutation_is_an_error() {
        let base = v(json!({"a": 1}));
        let err = produce(&base, |d| {
            d.set("a", 2i64)?;
            Ok(Some(Value::Null))
        })
        .unwrap_err();
        assert_eq!(err, DraftError::ReplacedAndMutated);
    }

    #[test]
    fn split_lifecycle() {
        let base = v(json!({"a": 1}));
        let draft = create_draft(&base).unwrap();
        draft.set("a", 2i64).unwrap();
        let handle = draft.clone();
        let out = finish_draft(draft).unwrap();
        assert_eq!(out, v(json!({"a": 2})));
        assert_eq!(handle.get("a").unwrap_err(), DraftError::UsedAfterFinalize);
    }

    #[test]
    fn finishing_a_nested_draft_is_an_error() {
        let base = v(json!({"a": {"b": 1}}));
        let root = create_draft(&base).unwrap();
        let nested = root.get_draft("a").unwrap();
        assert_eq!(
            finish_draft(nested).unwrap_err(),
            DraftError::NestedDraftLeak
        );
        // The scope stays open and can still be committed.
        root.set("c", 3i64).unwrap();
        let out = finish_draft(root).unwrap();
        assert_eq!(out, v(json!({"a": {"b": 1}, "c": 3})));
    }

    #[test]
    fn scalar_base_is_rejected() {
        let err = produce(&Value::Int(1), |_| Ok(None)).unwrap_err();
        assert!(matches!(
            err,
            DraftError::UnsupportedArchetype { op: "draft", .. }
        ));
    }
}
