use serde_json::{Value, json};

use survey_flow::{
    AnswerStore, Catalog, LatestPurchase, OrderedSampler, PipingPlan, PipingResolver,
    QuestionOption, RandomSampler, RespondentMetadata, SurveyConfig, UserStatus,
};

fn catalog() -> Catalog {
    Catalog::from_json(include_str!("fixtures/catalog.json")).expect("catalog loads")
}

fn ordered_resolver() -> PipingResolver {
    let config = SurveyConfig::from_json(include_str!("fixtures/config.json")).expect("config");
    PipingResolver::new(config.piping, Box::new(OrderedSampler))
}

fn answers(catalog: &Catalog, value: Value) -> AnswerStore {
    AnswerStore::from_json(catalog, &value).expect("answers load")
}

fn values(catalog: &Catalog, id: &str) -> Vec<String> {
    catalog
        .question(id)
        .map(|question| question.options.iter().map(|o| o.value.clone()).collect())
        .unwrap_or_default()
}

fn ids(catalog: &Catalog) -> Vec<&str> {
    catalog.iter().map(|question| question.id.as_str()).collect()
}

#[test]
fn carry_forward_keeps_source_order() {
    let template = catalog();
    let store = answers(&template, json!({"P1": ["5", "2"]}));
    let resolved = ordered_resolver().resolve(&template, &store, &RespondentMetadata::default());
    let p2 = resolved.question("P2").expect("P2");
    assert_eq!(
        p2.options,
        vec![
            QuestionOption::new("2", "ลีไวส์ (Levi's)"),
            QuestionOption::new("5", "จี คิว (GQ)"),
        ]
    );
}

#[test]
fn carry_forward_uses_the_source_question_options() {
    let template = Catalog::from_value(json!([
        {"id": "brands", "questionType": "MA", "questionText": "Brands",
         "options": [
             {"value": "1", "label": "Mc Jeans"},
             {"value": "2", "label": "Levi's"},
             {"value": "5", "label": "GQ"}
         ]},
        {"id": "fits", "questionType": "MA", "questionText": "Fits worn",
         "options": [
             {"value": "1", "label": "Slim"},
             {"value": "2", "label": "Regular"},
             {"value": "5", "label": "Loose"},
             {"value": "9", "label": "Bootcut"}
         ]},
        {"id": "favourite_fit", "questionType": "SA", "questionText": "Favourite fit"},
        {"id": "untried_fits", "questionType": "MA", "questionText": "Fits you would try"},
        {"id": "skipped_fits", "questionType": "MA", "questionText": "Fits you skipped"}
    ]))
    .expect("catalog loads");
    let plan: PipingPlan = serde_json::from_value(json!({
        "projections": [
            {"kind": "carry_forward", "target": "favourite_fit", "source": "fits"},
            {"kind": "difference", "target": "untried_fits", "include": "fits", "exclude": "brands"}
        ]
    }))
    .expect("plan parses");
    let store = answers(&template, json!({"fits": ["9", "5", "2"], "brands": ["2"]}));

    let resolved = PipingResolver::new(plan.clone(), Box::new(OrderedSampler)).resolve(
        &template,
        &store,
        &RespondentMetadata::default(),
    );
    let favourite = resolved.question("favourite_fit").expect("favourite_fit");
    assert_eq!(
        favourite.options,
        vec![
            QuestionOption::new("2", "Regular"),
            QuestionOption::new("5", "Loose"),
            QuestionOption::new("9", "Bootcut"),
        ]
    );
    assert_eq!(values(&resolved, "untried_fits"), vec!["5", "9"]);

    let with_brands = PipingPlan {
        brand_source: Some("brands".into()),
        ..plan
    };
    let resolved = PipingResolver::new(with_brands, Box::new(OrderedSampler)).resolve(
        &template,
        &store,
        &RespondentMetadata::default(),
    );
    assert_eq!(values(&resolved, "favourite_fit"), vec!["2", "5", "9"]);
    assert_eq!(
        resolved.question("favourite_fit").expect("favourite_fit").options[0].label,
        "Regular"
    );
}

#[test]
fn unrenderable_text_keeps_the_authored_wording() {
    let template = Catalog::from_value(json!([
        {"id": "Q1", "questionType": "OE", "questionText": "Where did you buy {{purchase.brand}}?",
         "questionSubtext": "Think of {{brand"}
    ]))
    .expect("catalog loads");
    let store = AnswerStore::for_catalog(&template);
    let resolved = ordered_resolver().resolve(&template, &store, &RespondentMetadata::default());
    assert_eq!(resolved.question("Q1"), template.question("Q1"));
}

#[test]
fn set_projections_follow_brand_answers() {
    let template = catalog();
    let store = answers(
        &template,
        json!({
            "P1": ["1", "2", "3", "4"],
            "P2": ["1", "2", "3"],
            "P3": ["3", "1"],
            "P5": ["2"],
            "P12a": ["3", "1"]
        }),
    );
    let resolved = ordered_resolver().resolve(&template, &store, &RespondentMetadata::default());
    assert_eq!(values(&resolved, "P3"), vec!["1", "2", "3"]);
    assert_eq!(values(&resolved, "P4"), vec!["1", "3"]);
    assert_eq!(values(&resolved, "P5"), vec!["2", "4"]);
    assert_eq!(values(&resolved, "P7"), vec!["1", "2", "3"]);
    assert_eq!(values(&resolved, "P9b"), vec!["2", "3"]);
    assert_eq!(values(&resolved, "P9d"), vec!["1", "2", "3"]);
    assert_eq!(values(&resolved, "P11"), vec!["1", "2", "3"]);
    assert_eq!(values(&resolved, "P12b"), vec!["1", "3"]);
}

#[test]
fn empty_sources_yield_empty_options() {
    let template = catalog();
    let store = AnswerStore::for_catalog(&template);
    let resolved = ordered_resolver().resolve(&template, &store, &RespondentMetadata::default());
    for id in ["P2", "P3", "P4", "P5", "P7", "P9b", "P11", "P12b"] {
        assert!(values(&resolved, id).is_empty(), "{id} has no options");
    }
    // Authored placeholder stays until brands are known.
    assert_eq!(ids(&resolved), ids(&template));
    assert_eq!(values(&resolved, "P1").len(), 22);
}

#[test]
fn perception_questions_materialize_after_anchor() {
    let template = catalog();
    let store = answers(&template, json!({"P3": ["3", "1"], "P5": ["2"]}));
    let mut resolver = ordered_resolver();
    let resolved = resolver.resolve(&template, &store, &RespondentMetadata::default());

    let anchor = resolved.position("P8a").expect("P8a");
    let generated: Vec<&str> = resolved
        .questions()
        .get(anchor + 1..anchor + 4)
        .expect("three generated questions")
        .iter()
        .map(|q| q.id.as_str())
        .collect();
    assert_eq!(generated, vec!["P8b", "P8c", "P8d"]);
    assert_eq!(resolved.len(), template.len() + 2);
    assert_eq!(resolver.materialized_count(), Some(3));

    let texts: Vec<&str> = resolved.questions()[anchor + 1..anchor + 4]
        .iter()
        .map(|q| q.question_text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec![
            "What comes into your mind when you think of แรงเลอร์ (Wrangler)?",
            "What comes into your mind when you think of ลีไวส์ (Levi's)?",
            "What comes into your mind when you think of ลี คูปเปอร์ (Lee Cooper)?",
        ]
    );
    let subtext = resolved.questions()[anchor + 1]
        .question_subtext
        .as_deref()
        .expect("subtext");
    assert!(subtext.starts_with("เมื่อนึก แรงเลอร์ (Wrangler)"));
}

#[test]
fn materialized_ids_stay_fixed_when_brands_change() {
    let template = catalog();
    let mut resolver = ordered_resolver();
    let who = RespondentMetadata::default();
    let first = answers(&template, json!({"P3": ["3"], "P5": ["2", "7"]}));
    let before = resolver.resolve(&template, &first, &who);

    let second = answers(&template, json!({"P3": ["4"], "P5": []}));
    let after = resolver.resolve(&template, &second, &who);
    assert_eq!(ids(&before), ids(&after));
    assert_eq!(resolver.materialized_count(), Some(3));
    let p8b = after.question("P8b").expect("P8b");
    assert!(p8b.question_text.contains("Lee Cooper"));

    let cleared = AnswerStore::for_catalog(&template);
    let emptied = resolver.resolve(&template, &cleared, &who);
    assert_eq!(ids(&emptied), ids(&before));
}

#[test]
fn sampling_is_cached_per_source_answers() {
    let template = catalog();
    let config = SurveyConfig::from_json(include_str!("fixtures/config.json")).expect("config");
    let mut resolver = PipingResolver::new(config.piping, Box::new(RandomSampler::seeded(42)));
    let who = RespondentMetadata::default();
    let store = answers(
        &template,
        json!({"P3": ["2", "3", "4", "5", "6", "7"], "P5": ["8", "9", "1"]}),
    );

    let first = resolver.resolve(&template, &store, &who);
    let second = resolver.resolve(&template, &store, &who);
    assert_eq!(first, second);

    let p11 = values(&first, "P11");
    assert_eq!(p11.len(), 5);
    assert_eq!(p11[0], "1");

    resolver.reset();
    assert_eq!(resolver.materialized_count(), None);
}

#[test]
fn reordered_selection_keeps_the_cached_sample() {
    let template = catalog();
    let config = SurveyConfig::from_json(include_str!("fixtures/config.json")).expect("config");
    let mut resolver = PipingResolver::new(config.piping, Box::new(RandomSampler::seeded(7)));
    let who = RespondentMetadata::default();

    let picked = answers(
        &template,
        json!({"P3": ["2", "3", "4", "5", "6", "7"], "P5": ["8", "9", "1"]}),
    );
    let reordered = answers(
        &template,
        json!({"P3": ["7", "6", "5", "4", "3", "2"], "P5": ["1", "9", "8"]}),
    );
    let first = resolver.resolve(&template, &picked, &who);
    let second = resolver.resolve(&template, &reordered, &who);
    assert_eq!(values(&first, "P11"), values(&second, "P11"));
    for id in ["P8b", "P8c", "P8d"] {
        assert_eq!(
            first.question(id).map(|q| &q.question_text),
            second.question(id).map(|q| &q.question_text)
        );
    }
}

#[test]
fn changed_sources_reselect_samples() {
    let template = catalog();
    let mut resolver = ordered_resolver();
    let who = RespondentMetadata::default();

    let before = answers(&template, json!({"P3": ["3"], "P5": ["2"]}));
    let resolved = resolver.resolve(&template, &before, &who);
    assert_eq!(values(&resolved, "P11"), vec!["1", "2", "3"]);
    let p8b = resolved.question("P8b").expect("P8b");
    assert!(p8b.question_text.contains("Wrangler"));

    let after = answers(&template, json!({"P3": ["4"], "P5": ["5"]}));
    let resolved = resolver.resolve(&template, &after, &who);
    assert_eq!(values(&resolved, "P11"), vec!["1", "4", "5"]);
    let texts: Vec<&str> = ["P8b", "P8c", "P8d"]
        .iter()
        .filter_map(|id| resolved.question(id))
        .map(|q| q.question_text.as_str())
        .collect();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].contains("Lee Cooper"));
    assert!(texts[1].contains("GQ"));
    assert!(texts[2].contains("Levi's"));
    assert_eq!(resolver.materialized_count(), Some(3));
}

#[test]
fn purchase_text_override_applies_with_history() {
    let template = catalog();
    let store = AnswerStore::for_catalog(&template);
    let who = RespondentMetadata {
        province: Some("Bangkok".into()),
        user_status: UserStatus::User,
        latest_purchase: Some(LatestPurchase {
            brand: Some("Mc Jeans".into()),
            product_type: Some("Jeans".into()),
            product_name: Some("Slim 505".into()),
            purchase_date: Some("2025-03-07T10:00:00Z".into()),
            store_location: None,
        }),
    };
    let mut resolver = ordered_resolver();
    let resolved = resolver.resolve(&template, &store, &who);
    let p9a = resolved.question("P9a").expect("P9a");
    assert!(p9a.question_text.contains("Jeans Slim 505 เมื่อ 7 March 2025"));
    assert_eq!(
        p9a.question_subtext.as_deref(),
        Some(
            "Before making your purchase of Jeans Slim 505 on 7 March 2025, did you make any brand comparisons before you made your decision to purchase?"
        )
    );

    let anonymous = resolver.resolve(&template, &store, &RespondentMetadata::default());
    assert_eq!(
        anonymous.question("P9a").map(|q| q.question_text.as_str()),
        template.question("P9a").map(|q| q.question_text.as_str())
    );
}
