use redraft::{apply_patches, produce_with_patches, DraftError, Key, PatchOp, Value};
use serde_json::json;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn roundtrip(base: Value, recipe: impl FnOnce(&redraft::Draft) -> redraft::DraftResult<()>) {
    let (next, forward, inverse) = produce_with_patches(&base, |d| {
        recipe(d)?;
        Ok(None)
    })
    .unwrap();
    assert_eq!(apply_patches(&base, &forward).unwrap(), next);
    assert_eq!(apply_patches(&next, &inverse).unwrap(), base);
}

#[test]
fn object_edits_roundtrip() {
    roundtrip(v(json!({"a": 1, "b": 2, "keep": 3})), |d| {
        d.set("a", 10i64)?;
        d.delete("b")?;
        d.set("c", 4i64)?;
        Ok(())
    });
}

#[test]
fn deep_edits_roundtrip() {
    roundtrip(v(json!({"x": {"y": {"z": [1, {"w": 2}]}}})), |d| {
        let z = d.get_draft("x")?.get_draft("y")?.get_draft("z")?;
        z.get_draft(1)?.set("w", 3i64)?;
        z.push(9i64)?;
        Ok(())
    });
}

#[test]
fn array_splices_roundtrip() {
    roundtrip(v(json!([1, 2, 3, 4])), |d| {
        d.remove_index(1)?;
        d.push(5i64)?;
        Ok(())
    });
    roundtrip(v(json!([1, 2, 3])), |d| {
        d.insert_index(0, 0i64)?;
        Ok(())
    });
    roundtrip(v(json!([1, 2, 3])), |d| {
        d.remove_index(2)?;
        d.remove_index(0)?;
        Ok(())
    });
}

#[test]
fn set_membership_roundtrip() {
    roundtrip(Value::set([Value::Int(1), Value::Int(2), Value::Int(3)]), |d| {
        d.remove(2i64)?;
        d.add(4i64)?;
        Ok(())
    });
}

#[test]
fn map_edits_roundtrip() {
    let base = Value::map([
        (Value::Int(1), Value::from("one")),
        (Value::Int(2), Value::from("two")),
    ]);
    roundtrip(base, |d| {
        d.set(Key::Item(Value::Int(1)), "uno")?;
        d.delete(Key::Item(Value::Int(2)))?;
        d.set(Key::Item(Value::Int(3)), "tres")?;
        Ok(())
    });
}

#[test]
fn subtree_replacement_roundtrip() {
    roundtrip(v(json!({"a": {"deep": {"n": 1}}})), |d| {
        // Mutate first, then overwrite the whole subtree: the patch list
        // must collapse to the parent-level replace.
        d.get_draft("a")?.get_draft("deep")?.set("n", 5i64)?;
        d.set("a", v(json!({"other": true})))?;
        Ok(())
    });
}

#[test]
fn patches_survive_the_wire() {
    let base = v(json!({"a": [1, 2], "s": "x"}));
    let (next, forward, _) = produce_with_patches(&base, |d| {
        d.get_draft("a")?.remove_index(0)?;
        d.set("s", "y")?;
        Ok(None)
    })
    .unwrap();
    let wire = serde_json::to_string(&forward).unwrap();
    let decoded: Vec<PatchOp> = serde_json::from_str(&wire).unwrap();
    assert_eq!(decoded, forward);
    assert_eq!(apply_patches(&base, &decoded).unwrap(), next);
}

#[test]
fn map_and_set_patches_survive_the_wire() {
    // On the wire an item key is indistinguishable from an index or field;
    // apply re-keys against the container it actually lands on.
    let base = Value::map([(Value::Int(1), Value::from("one"))]);
    let (next, forward, _) = produce_with_patches(&base, |d| {
        d.set(Key::Item(Value::Int(1)), "uno")?;
        Ok(None)
    })
    .unwrap();
    let wire = serde_json::to_string(&forward).unwrap();
    let decoded: Vec<PatchOp> = serde_json::from_str(&wire).unwrap();
    assert_eq!(apply_patches(&base, &decoded).unwrap(), next);

    let base = Value::set([Value::Int(1), Value::Int(2)]);
    let (next, forward, _) = produce_with_patches(&base, |d| {
        d.remove(2i64)?;
        d.add(3i64)?;
        Ok(None)
    })
    .unwrap();
    let wire = serde_json::to_string(&forward).unwrap();
    let decoded: Vec<PatchOp> = serde_json::from_str(&wire).unwrap();
    assert_eq!(apply_patches(&base, &decoded).unwrap(), next);
}

#[test]
fn apply_reports_unresolved_paths() {
    let base = v(json!({"a": {"b": 1}}));
    let err = apply_patches(
        &base,
        &[PatchOp::Remove {
            path: vec![Key::Field("a".into()), Key::Field("missing".into())],
            value: None,
        }],
    )
    .unwrap_err();
    assert_eq!(err, DraftError::PatchPathNotFound("/a/missing".into()));
}

#[test]
fn apply_is_order_sensitive() {
    let base = v(json!([1, 2, 3]));
    let out = apply_patches(
        &base,
        &[
            PatchOp::Remove {
                path: vec![Key::Index(0)],
                value: None,
            },
            PatchOp::Add {
                path: vec![Key::Index(0)],
                value: Value::Int(9),
            },
        ],
    )
    .unwrap();
    assert_eq!(out, v(json!([9, 2, 3])));
}

#[test]
fn no_change_produces_no_patches() {
    let base = v(json!({"a": 1}));
    let (next, forward, inverse) = produce_with_patches(&base, |d| {
        d.set("a", 1i64)?; // same value, elided
        Ok(None)
    })
    .unwrap();
    assert!(forward.is_empty());
    assert!(inverse.is_empty());
    assert!(next.ptr_eq(&base));
}
