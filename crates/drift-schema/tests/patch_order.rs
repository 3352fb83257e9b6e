//! Property tests: the patched document does not depend on edit order or
//! on how often an edit repeats.

use drift_core::{JsonKind, JsonPointer};
use drift_schema::{apply_edits, Edit};
use proptest::prelude::*;
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "action": {"enum": ["opened"]},
            "issue": {
                "type": "object",
                "properties": {
                    "state": {"enum": ["open"]},
                    "milestone": {"type": "object"},
                    "comments": {"type": "integer"}
                }
            },
            "label": {"oneOf": [{"type": "object"}, {"type": "null"}]}
        }
    })
}

fn kind() -> impl Strategy<Value = JsonKind> {
    prop_oneof![
        Just(JsonKind::Null),
        Just(JsonKind::Boolean),
        Just(JsonKind::Number),
        Just(JsonKind::String),
        Just(JsonKind::Array),
    ]
}

fn edit() -> impl Strategy<Value = Edit> {
    let broaden_targets = prop_oneof![
        Just("/properties/issue"),
        Just("/properties/issue/properties/milestone"),
        Just("/properties/issue/properties/comments"),
        Just("/properties/label"),
    ];
    let enum_targets = prop_oneof![
        Just("/properties/action"),
        Just("/properties/issue/properties/state"),
    ];
    prop_oneof![
        (broaden_targets, kind()).prop_map(|(t, observed)| Edit::BroadenType {
            target: JsonPointer::parse(t).unwrap(),
            observed,
        }),
        (enum_targets, "[a-z]{1,4}").prop_map(|(t, v)| Edit::ExtendEnum {
            target: JsonPointer::parse(t).unwrap(),
            value: Value::String(v),
        }),
    ]
}

proptest! {
    #[test]
    fn edit_order_does_not_matter(
        shuffled in proptest::collection::vec(edit(), 0..8).prop_flat_map(|edits| {
            let original = Just(edits.clone());
            (original, Just(edits).prop_shuffle())
        })
    ) {
        let (original, permuted) = shuffled;
        let schema = schema();
        prop_assert_eq!(
            apply_edits(&schema, &original).unwrap(),
            apply_edits(&schema, &permuted).unwrap()
        );
    }

    #[test]
    fn repeated_edits_apply_once(edits in proptest::collection::vec(edit(), 1..6)) {
        let schema = schema();
        let once = apply_edits(&schema, &edits).unwrap();
        let twice: Vec<Edit> = edits.iter().chain(edits.iter()).cloned().collect();
        prop_assert_eq!(apply_edits(&schema, &twice).unwrap(), once);
    }
}
