/// Automation engine core
///
/// Given one domain event, the engine loads the organization's active rules
/// for that trigger, evaluates each rule's condition against the event
/// context, and runs the actions of every matching rule.
///
/// # Execution semantics
///
/// - Matched rules run concurrently and independently; one rule failing
///   never affects another.
/// - Within a rule, actions run strictly in declared order. The first
///   failure aborts the rule's remaining actions and is recorded with the
///   failing index.
/// - Rules whose condition evaluates false are skipped and leave no audit
///   record.
/// - Engine failures never propagate to the caller that emitted the event;
///   the event write has already committed by the time rules run.
use crate::executors::{ExecContext, ExecutorRegistry};
use crate::store::{ExecutionSink, RuleSource, StoreError};
use futures::future::join_all;
use pivotcrm_shared::automation::DomainEvent;
use pivotcrm_shared::models::automation_execution::NewExecution;
use pivotcrm_shared::models::automation_rule::AutomationRule;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome summary for one handled event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineReport {
    /// Rules whose condition matched
    pub matched: usize,

    /// Rules whose condition evaluated false
    pub skipped: usize,

    /// Matched rules where every action succeeded
    pub succeeded: usize,

    /// Matched rules aborted by an action failure
    pub failed: usize,
}

/// The automation engine, generic over its storage backend
pub struct AutomationEngine<S> {
    store: Arc<S>,
    registry: ExecutorRegistry,
}

impl<S> AutomationEngine<S>
where
    S: RuleSource + ExecutionSink + 'static,
{
    pub fn new(store: Arc<S>, registry: ExecutorRegistry) -> Self {
        AutomationEngine { store, registry }
    }

    /// Handles one domain event end to end
    ///
    /// # Errors
    ///
    /// Returns an error only when the rule set cannot be loaded. Action
    /// failures are recorded per rule and reflected in the report, not
    /// surfaced as errors.
    pub async fn handle_event(&self, event: &DomainEvent) -> Result<EngineReport, StoreError> {
        let trigger = event.trigger.as_str();
        let rules = self.store.active_rules(event.org_id, event.trigger).await?;

        if rules.is_empty() {
            return Ok(EngineReport::default());
        }

        let mut report = EngineReport::default();
        let mut matched = Vec::new();

        for rule in rules {
            if rule.condition.0.matches(&event.context) {
                report.matched += 1;
                matched.push(rule);
            } else {
                report.skipped += 1;
            }
        }

        let outcomes = join_all(
            matched
                .into_iter()
                .map(|rule| self.execute_rule(rule, event)),
        )
        .await;

        for succeeded in outcomes {
            if succeeded {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            trigger = %trigger,
            org_id = %event.org_id,
            matched = report.matched,
            skipped = report.skipped,
            failed = report.failed,
            "Automation event handled"
        );

        Ok(report)
    }

    /// Runs one matched rule's actions in order and records the outcome
    ///
    /// Returns true when every action succeeded.
    async fn execute_rule(&self, rule: AutomationRule, event: &DomainEvent) -> bool {
        let trigger = event.trigger.as_str();
        let snapshot = JsonValue::Object(event.context.clone());

        let ctx = ExecContext {
            org_id: event.org_id,
            rule_id: rule.id,
            trigger: trigger.to_string(),
            context: event.context.clone(),
        };

        let mut failure: Option<(usize, String)> = None;
        for (index, action) in rule.actions.0.iter().enumerate() {
            if let Err(e) = self.registry.dispatch(action, &ctx).await {
                warn!(
                    rule_id = %rule.id,
                    action_index = index,
                    kind = %action.kind(),
                    error = %e,
                    "Automation action failed; aborting rule"
                );
                failure = Some((index, e.to_string()));
                break;
            }
        }

        let succeeded = failure.is_none();
        let execution = match failure {
            None => NewExecution::success(rule.id, event.org_id, trigger, snapshot),
            Some((index, error)) => {
                NewExecution::failed(rule.id, event.org_id, trigger, snapshot, index, error)
            }
        };

        if let Err(e) = self.store.record(execution).await {
            // The audit record is best-effort; the actions already ran.
            error!(rule_id = %rule.id, error = %e, "Failed to record automation execution");
        }

        succeeded
    }
}
