//! Template service: gated creation and duplication, CRUD, and the usage
//! snapshot the dashboard renders.

use std::sync::Arc;

use tally_core::config::TallyConfig;
use tally_core::models::gate::DenialReason;
use tally_core::models::subscription::BillingEvent;
use tally_core::models::template::{NewTemplate, Platform, TemplateFilter, TemplateUpdate};
use tally_core::models::PlanTier;
use tally_core::traits::ITallyStorage;
use tally_core::TallyError;
use tally_gate::TallyRuntime;
use tally_storage::StorageEngine;

fn setup() -> TallyRuntime {
    setup_with_config(&TallyConfig::default())
}

fn setup_with_config(config: &TallyConfig) -> TallyRuntime {
    let engine = Arc::new(StorageEngine::open_in_memory().unwrap());
    let runtime = TallyRuntime::new(engine as Arc<dyn ITallyStorage>, config);
    runtime.initialize().unwrap();
    runtime
}

fn new_template(name: &str) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        description: Some("spring campaign".to_string()),
        hashtags: vec!["#spring".to_string(), "#sale".to_string()],
        category: Some("marketing".to_string()),
        platform: Platform::Instagram,
    }
}

#[test]
fn templates_create_and_read_back() {
    let runtime = setup();
    let created = runtime
        .templates()
        .create("u1", new_template("Spring"))
        .unwrap()
        .into_value()
        .unwrap();

    let fetched = runtime.templates().get("u1", &created.id).unwrap();
    assert_eq!(fetched.name, "Spring");
    assert_eq!(fetched.hashtags, vec!["#spring", "#sale"]);
    assert_eq!(fetched.platform, Platform::Instagram);
}

#[test]
fn templates_create_consumes_one_unit() {
    let runtime = setup();
    runtime
        .templates()
        .create("u1", new_template("One"))
        .unwrap();

    let stats = runtime.templates().usage_stats("u1").unwrap();
    assert_eq!(stats.current, 1);
    assert_eq!(stats.limit, 20);
    assert_eq!(stats.percentage, 5);
}

#[test]
fn templates_invalid_input_consumes_nothing() {
    let runtime = setup();

    let mut bad = new_template("  ");
    let result = runtime.templates().create("u1", bad.clone());
    assert!(matches!(result, Err(TallyError::InvalidInput(_))));

    bad.name = "ok".to_string();
    bad.hashtags = vec![];
    let result = runtime.templates().create("u1", bad);
    assert!(matches!(result, Err(TallyError::InvalidInput(_))));

    // Validation ran before the gate: no unit consumed.
    assert_eq!(runtime.templates().usage_stats("u1").unwrap().current, 0);
}

#[test]
fn templates_limit_denies_with_upgrade_hint() {
    let config = TallyConfig::from_toml(
        r#"
        [quota.limits.free]
        template_creation = 2
        "#,
    )
    .unwrap();
    let runtime = setup_with_config(&config);

    for i in 0..2 {
        let outcome = runtime
            .templates()
            .create("u1", new_template(&format!("t{}", i)))
            .unwrap();
        assert!(outcome.denial().is_none());
    }

    let denied = runtime
        .templates()
        .create("u1", new_template("overflow"))
        .unwrap();
    assert_eq!(denied.denial(), Some(DenialReason::LimitReached(2)));

    // The denied template was never stored.
    let page = runtime
        .templates()
        .list("u1", &TemplateFilter::default())
        .unwrap();
    assert_eq!(page.total_count, 2);
}

#[test]
fn templates_duplicate_copies_and_consumes() {
    let runtime = setup();
    let original = runtime
        .templates()
        .create("u1", new_template("Original"))
        .unwrap()
        .into_value()
        .unwrap();

    let copy = runtime
        .templates()
        .duplicate("u1", &original.id)
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(copy.name, "Original (Copy)");
    assert_eq!(copy.hashtags, original.hashtags);
    assert_ne!(copy.id, original.id);

    assert_eq!(runtime.templates().usage_stats("u1").unwrap().current, 2);
}

#[test]
fn templates_duplicate_missing_source_consumes_nothing() {
    let runtime = setup();
    let result = runtime.templates().duplicate("u1", "ghost");
    assert!(matches!(result, Err(TallyError::TemplateNotFound { .. })));
    assert_eq!(runtime.templates().usage_stats("u1").unwrap().current, 0);
}

#[test]
fn templates_list_filters_and_paginates() {
    let runtime = setup();
    for i in 0..3 {
        let mut input = new_template(&format!("t{}", i));
        if i == 2 {
            input.category = Some("food".to_string());
            input.platform = Platform::Twitter;
        }
        runtime.templates().create("u1", input).unwrap();
    }

    let page = runtime
        .templates()
        .list(
            "u1",
            &TemplateFilter {
                category: Some("food".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.templates[0].name, "t2");

    let paged = runtime
        .templates()
        .list(
            "u1",
            &TemplateFilter {
                limit: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(paged.templates.len(), 2);
    assert!(paged.has_more);
}

#[test]
fn templates_update_and_delete() {
    let runtime = setup();
    let created = runtime
        .templates()
        .create("u1", new_template("Before"))
        .unwrap()
        .into_value()
        .unwrap();

    let updated = runtime
        .templates()
        .update(
            "u1",
            &created.id,
            &TemplateUpdate {
                name: Some("After".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "After");
    assert_eq!(updated.hashtags, created.hashtags);

    runtime.templates().delete("u1", &created.id).unwrap();
    let result = runtime.templates().get("u1", &created.id);
    assert!(matches!(result, Err(TallyError::TemplateNotFound { .. })));

    // Deleting does not refund the creation unit.
    assert_eq!(runtime.templates().usage_stats("u1").unwrap().current, 1);
}

#[test]
fn templates_update_rejects_bad_payload() {
    let runtime = setup();
    let created = runtime
        .templates()
        .create("u1", new_template("Keep"))
        .unwrap()
        .into_value()
        .unwrap();

    let result = runtime.templates().update(
        "u1",
        &created.id,
        &TemplateUpdate {
            hashtags: Some(vec![]),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(TallyError::InvalidInput(_))));
}

#[test]
fn templates_categories_are_distinct() {
    let runtime = setup();
    for category in ["marketing", "food", "marketing"] {
        let mut input = new_template(category);
        input.category = Some(category.to_string());
        runtime.templates().create("u1", input).unwrap();
    }

    assert_eq!(
        runtime.templates().categories("u1").unwrap(),
        vec!["food".to_string(), "marketing".to_string()]
    );
}

#[test]
fn templates_usage_stats_reflect_plan() {
    let runtime = setup();
    runtime
        .billing()
        .apply_event(&BillingEvent::CheckoutCompleted {
            user_id: "u1".to_string(),
            tier: PlanTier::Pro,
            period_start_at: 0,
            period_end_at: i64::MAX,
        })
        .unwrap();

    let stats = runtime.templates().usage_stats("u1").unwrap();
    assert_eq!(stats.limit, 100);
    assert!(stats.has_active_subscription);
}
