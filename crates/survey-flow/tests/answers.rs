use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::json;

use survey_flow::{Answer, AnswerStore, Catalog, FlowError, Toggle};

fn small_catalog() -> Catalog {
    Catalog::from_value(json!([
        {"id": "gender", "questionType": "SA", "questionText": "Gender",
         "options": [{"value": "1", "label": "Male"}, {"value": "2", "label": "Female"}]},
        {"id": "brands", "questionType": "MA", "questionText": "Brands", "maxSelections": 2,
         "options": [{"value": "1", "label": "A"}, {"value": "2", "label": "B"}, {"value": "3", "label": "C"}]},
        {"id": "why", "questionType": "OE", "questionText": "Why?"},
        {"id": "fit", "questionType": "MA", "questionText": "Fit", "attributes": ["Cool", "Cheap"]}
    ]))
    .expect("catalog loads")
}

#[test]
fn store_initializes_type_appropriate_empties() {
    let store = AnswerStore::for_catalog(&small_catalog());
    assert_eq!(store.get("gender"), Some(&Answer::Single(String::new())));
    assert_eq!(store.get("brands"), Some(&Answer::Multi(Vec::new())));
    assert_eq!(store.get("why"), Some(&Answer::Text(String::new())));
    assert_eq!(store.get("fit"), Some(&Answer::Matrix(BTreeMap::new())));
    assert!(!store.is_answered("gender"));
}

#[test]
fn toggle_adds_removes_and_respects_max() {
    let mut store = AnswerStore::for_catalog(&small_catalog());
    assert_eq!(store.toggle_multi("brands", "1", 2).expect("add"), Toggle::Added);
    assert_eq!(store.toggle_multi("brands", "2", 2).expect("add"), Toggle::Added);

    let err = store
        .toggle_multi("brands", "3", 2)
        .expect_err("third selection rejected");
    assert!(matches!(
        err,
        FlowError::SelectionLimitExceeded { ref question_id, max: 2 } if question_id == "brands"
    ));
    assert_eq!(store.selected("brands"), vec!["1", "2"]);

    assert_eq!(store.toggle_multi("brands", "1", 2).expect("remove"), Toggle::Removed);
    assert_eq!(store.toggle_multi("brands", "3", 2).expect("add"), Toggle::Added);
    assert_eq!(store.selected("brands"), vec!["2", "3"]);
}

#[test]
fn set_single_keeps_audio_on_the_side() {
    let mut store = AnswerStore::for_catalog(&small_catalog());
    store
        .set_single("why", "comfortable", Some("blob:why.webm".into()))
        .expect("text answer");
    assert_eq!(store.get("why"), Some(&Answer::Text("comfortable".into())));
    assert_eq!(store.audio("why"), Some("blob:why.webm"));
    let keys: Vec<String> = store.audio_entries().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["why_audio".to_string()]);
}

#[test]
fn kind_mismatch_is_rejected() {
    let mut store = AnswerStore::for_catalog(&small_catalog());
    let err = store
        .set_single("brands", "1", None)
        .expect_err("multi slot refuses single value");
    assert!(matches!(err, FlowError::AnswerKindMismatch { expected: "multi", .. }));
    let err = store
        .toggle_multi("gender", "1", 0)
        .expect_err("single slot refuses toggle");
    assert!(matches!(err, FlowError::AnswerKindMismatch { expected: "single", .. }));
}

#[test]
fn matrix_cells_toggle_per_attribute() {
    let mut store = AnswerStore::for_catalog(&small_catalog());
    store.toggle_matrix_cell("fit", "a", "1").expect("toggle");
    store.toggle_matrix_cell("fit", "a", "5").expect("toggle");
    store.toggle_matrix_cell("fit", "a", "5").expect("toggle back");
    let mut expected = BTreeMap::new();
    expected.insert("a".to_string(), vec!["1".to_string()]);
    assert_eq!(store.get("fit"), Some(&Answer::Matrix(expected)));

    let mut replacement = BTreeMap::new();
    replacement.insert("b".to_string(), vec!["2".into(), "2".into(), "3".into()]);
    store
        .set_attribute_matrix("fit", replacement)
        .expect("replace matrix");
    let Some(Answer::Matrix(cells)) = store.get("fit") else {
        panic!("matrix answer expected");
    };
    assert_eq!(cells.get("b"), Some(&vec!["2".to_string(), "3".to_string()]));
    assert!(!cells.contains_key("a"));
}

#[test]
fn reset_clears_answers_and_audio() {
    let catalog = small_catalog();
    let mut store = AnswerStore::for_catalog(&catalog);
    store.set_single("gender", "2", Some("blob:g".into())).expect("set");
    store.reset(&catalog);
    assert_eq!(store, AnswerStore::for_catalog(&catalog));
}

#[test]
fn json_answers_convert_by_question_kind() {
    let catalog = small_catalog();
    let store = AnswerStore::from_json(
        &catalog,
        &json!({
            "gender": 2,
            "brands": ["1", 3, "1"],
            "why": "fits well",
            "why_audio": "blob:audio",
            "fit": {"a": ["1"], "b": []},
            "stale": "ignored"
        }),
    )
    .expect("answers load");
    assert_eq!(store.get("gender"), Some(&Answer::Single("2".into())));
    assert_eq!(store.selected("brands"), vec!["1", "3"]);
    assert_eq!(store.audio("why"), Some("blob:audio"));
    assert!(store.get("stale").is_none());
    assert_eq!(store.to_json()["why_audio"], json!("blob:audio"));

    let err = AnswerStore::from_json(&catalog, &json!({"brands": "1"}))
        .expect_err("string for multi answer");
    assert!(matches!(err, FlowError::AnswerKindMismatch { .. }));
}

proptest! {
    #[test]
    fn toggles_never_exceed_max(
        max in 0u32..4,
        values in proptest::collection::vec(0u8..6, 0..24),
    ) {
        let mut store = AnswerStore::for_catalog(&small_catalog());
        for value in values {
            let value = value.to_string();
            let before = store.selected("brands").len();
            match store.toggle_multi("brands", &value, max) {
                Ok(_) => {}
                Err(FlowError::SelectionLimitExceeded { .. }) => {
                    prop_assert_eq!(store.selected("brands").len(), before);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            let selected = store.selected("brands");
            if max > 0 {
                prop_assert!(selected.len() <= max as usize);
            }
            let mut unique = selected.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), selected.len());
        }
    }
}
