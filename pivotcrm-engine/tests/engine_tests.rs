/// Automation engine integration tests
///
/// These exercise the full handle_event path against the in-memory store and
/// mock executors, so they run without a database.
use pivotcrm_engine::executors::{mock_registry, MockExecutor};
use pivotcrm_engine::{spawn_dispatcher, AutomationEngine, MemoryStore};
use pivotcrm_shared::automation::{ActionSpec, DomainEvent, Predicate, Trigger};
use pivotcrm_shared::models::automation_execution::ExecutionStatus;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn engine_with(
    store: &Arc<MemoryStore>,
    mock: &MockExecutor,
) -> AutomationEngine<MemoryStore> {
    AutomationEngine::new(Arc::clone(store), mock_registry(mock))
}

fn welcome_rule(org: Uuid) -> pivotcrm_shared::models::automation_rule::AutomationRule {
    MemoryStore::rule(
        org,
        "website lead welcome",
        "lead.created",
        Predicate::Eq {
            field: "source".into(),
            value: json!("website"),
        },
        vec![ActionSpec::SendEmail {
            template: "welcome".into(),
            to_field: None,
        }],
    )
}

#[tokio::test]
async fn matching_event_executes_and_records_once() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    let rule = welcome_rule(org);
    let rule_id = rule.id;
    store.add_rule(rule);

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    let event = DomainEvent::new(Trigger::LeadCreated, org)
        .with("source", json!("website"))
        .with("email", json!("ana@example.com"));

    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);

    let executed = mock.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].rule_id, rule_id);
    assert_eq!(executed[0].action.kind(), "send_email");

    let executions = store.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].rule_id, rule_id);
    assert_eq!(executions[0].status, ExecutionStatus::Success);
    assert_eq!(executions[0].trigger, "lead.created");
    // The audit record snapshots the context at evaluation time.
    assert_eq!(executions[0].context["source"], json!("website"));
}

#[tokio::test]
async fn non_matching_event_is_skipped_and_unrecorded() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(welcome_rule(org));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    let event = DomainEvent::new(Trigger::LeadCreated, org).with("source", json!("referral"));

    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 0);
    assert_eq!(report.skipped, 1);
    assert!(mock.executed().is_empty());
    assert!(store.executions().is_empty());
}

#[tokio::test]
async fn missing_condition_field_evaluates_false() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(welcome_rule(org));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    // No "source" field at all.
    let event = DomainEvent::new(Trigger::LeadCreated, org).with("budget", json!(5000));

    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert!(store.executions().is_empty());
}

#[tokio::test]
async fn actions_run_in_declared_order() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(MemoryStore::rule(
        org,
        "hot lead pipeline",
        "lead.created",
        Predicate::All {
            preds: vec![
                Predicate::Gt {
                    field: "budget".into(),
                    value: 1000.0,
                },
                Predicate::Eq {
                    field: "source".into(),
                    value: json!("referral"),
                },
            ],
        },
        vec![
            ActionSpec::SendNotification {
                channel: "sales".into(),
                message: "Hot referral lead".into(),
            },
            ActionSpec::SetStatus {
                record_field: None,
                status: "hot".into(),
            },
            ActionSpec::CreateTask {
                title: "Call within the hour".into(),
                due_in_days: Some(1),
            },
        ],
    ));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    let event = DomainEvent::new(Trigger::LeadCreated, org)
        .with("budget", json!(2500))
        .with("source", json!("referral"))
        .with("record_id", json!(Uuid::new_v4().to_string()));

    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.succeeded, 1);

    let kinds: Vec<_> = mock
        .executed()
        .iter()
        .map(|e| e.action.kind())
        .collect();
    assert_eq!(kinds, vec!["send_notification", "set_status", "create_task"]);
}

#[tokio::test]
async fn action_failure_aborts_rest_and_records_index() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(MemoryStore::rule(
        org,
        "flaky pipeline",
        "task.completed",
        Predicate::always(),
        vec![
            ActionSpec::Noop,
            ActionSpec::SendEmail {
                template: "done".into(),
                to_field: None,
            },
            ActionSpec::SendNotification {
                channel: "ops".into(),
                message: "should never run".into(),
            },
        ],
    ));

    let mock = MockExecutor::new();
    mock.fail_on("send_email");
    let engine = engine_with(&store, &mock);

    let event = DomainEvent::new(Trigger::TaskCompleted, org);
    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 0);

    // Only the action before the failure executed.
    let kinds: Vec<_> = mock.executed().iter().map(|e| e.action.kind()).collect();
    assert_eq!(kinds, vec!["noop"]);

    let executions = store.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
    assert_eq!(executions[0].failed_action_index, Some(1));
    assert!(executions[0].error.as_deref().unwrap_or("").contains("send_email"));
}

#[tokio::test]
async fn one_failing_rule_does_not_affect_others() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(MemoryStore::rule(
        org,
        "failing rule",
        "lead.created",
        Predicate::always(),
        vec![ActionSpec::SendEmail {
            template: "welcome".into(),
            to_field: None,
        }],
    ));
    store.add_rule(MemoryStore::rule(
        org,
        "healthy rule",
        "lead.created",
        Predicate::always(),
        vec![ActionSpec::SendNotification {
            channel: "sales".into(),
            message: "new lead".into(),
        }],
    ));

    let mock = MockExecutor::new();
    mock.fail_on("send_email");
    let engine = engine_with(&store, &mock);

    let event = DomainEvent::new(Trigger::LeadCreated, org);
    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);

    let executions = store.executions();
    assert_eq!(executions.len(), 2);
    let failed = executions
        .iter()
        .filter(|e| e.status == ExecutionStatus::Failed)
        .count();
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn rules_never_fire_across_tenants() {
    let store = Arc::new(MemoryStore::new());
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();
    store.add_rule(welcome_rule(org_a));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    // Same trigger and matching context, but the other tenant's event.
    let event = DomainEvent::new(Trigger::LeadCreated, org_b)
        .with("source", json!("website"))
        .with("email", json!("ana@example.com"));

    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 0);
    assert!(mock.executed().is_empty());
}

#[tokio::test]
async fn not_predicate_over_missing_field_matches() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(MemoryStore::rule(
        org,
        "non-website leads",
        "lead.created",
        Predicate::Not {
            pred: Box::new(Predicate::Eq {
                field: "source".into(),
                value: json!("website"),
            }),
        },
        vec![ActionSpec::Noop],
    ));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);

    // Missing field makes the inner Eq false, so Not matches.
    let event = DomainEvent::new(Trigger::LeadCreated, org);
    let report = engine.handle_event(&event).await.unwrap();
    assert_eq!(report.matched, 1);
}

#[tokio::test]
async fn dispatcher_feeds_engine_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let org = Uuid::new_v4();
    store.add_rule(welcome_rule(org));

    let mock = MockExecutor::new();
    let engine = engine_with(&store, &mock);
    let (dispatcher, handle) = spawn_dispatcher(engine);

    dispatcher.dispatch(
        DomainEvent::new(Trigger::LeadCreated, org)
            .with("source", json!("website"))
            .with("email", json!("ana@example.com")),
    );
    dispatcher.dispatch(
        DomainEvent::new(Trigger::LeadCreated, org).with("source", json!("referral")),
    );

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    handle.shutdown().await;

    // One match, one skip.
    assert_eq!(mock.executed().len(), 1);
    assert_eq!(store.executions().len(), 1);
}
