/// Rule and execution storage behind traits
///
/// The engine reads active rules through `RuleSource` and appends audit
/// records through `ExecutionSink`. Production wires both to Postgres via
/// `PgStore`; tests use `MemoryStore` and never touch a database.
use async_trait::async_trait;
use chrono::Utc;
use pivotcrm_shared::automation::Trigger;
use pivotcrm_shared::models::automation_execution::{AutomationExecution, NewExecution};
use pivotcrm_shared::models::automation_rule::{AutomationRule, RuleStatus};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// In-memory store lock poisoned
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read side: where the engine loads matching rules from
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Active rules for one organization and trigger
    async fn active_rules(
        &self,
        org_id: Uuid,
        trigger: Trigger,
    ) -> Result<Vec<AutomationRule>, StoreError>;
}

/// Write side: where the engine records execution outcomes
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    /// Appends one execution record
    async fn record(&self, execution: NewExecution) -> Result<(), StoreError>;
}

/// Postgres-backed store used in production
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl RuleSource for PgStore {
    async fn active_rules(
        &self,
        org_id: Uuid,
        trigger: Trigger,
    ) -> Result<Vec<AutomationRule>, StoreError> {
        let rules = AutomationRule::list_active_for_trigger(&self.pool, org_id, trigger).await?;
        Ok(rules)
    }
}

#[async_trait]
impl ExecutionSink for PgStore {
    async fn record(&self, execution: NewExecution) -> Result<(), StoreError> {
        AutomationExecution::record(&self.pool, execution).await?;
        Ok(())
    }
}

/// In-memory store for engine tests
///
/// Holds rules keyed by organization and collects recorded executions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rules: Arc<Mutex<HashMap<Uuid, Vec<AutomationRule>>>>,
    executions: Arc<Mutex<Vec<NewExecution>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the store
    pub fn add_rule(&self, rule: AutomationRule) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.entry(rule.org_id).or_default().push(rule);
        }
    }

    /// All executions recorded so far
    pub fn executions(&self) -> Vec<NewExecution> {
        self.executions
            .lock()
            .map(|execs| execs.clone())
            .unwrap_or_default()
    }

    /// Builds a minimal active rule for tests
    pub fn rule(
        org_id: Uuid,
        name: &str,
        trigger: &str,
        condition: pivotcrm_shared::automation::Predicate,
        actions: Vec<pivotcrm_shared::automation::ActionSpec>,
    ) -> AutomationRule {
        let now = Utc::now();
        AutomationRule {
            id: Uuid::new_v4(),
            org_id,
            name: name.to_string(),
            trigger: trigger.to_string(),
            condition: sqlx::types::Json(condition),
            actions: sqlx::types::Json(actions),
            status: RuleStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl RuleSource for MemoryStore {
    async fn active_rules(
        &self,
        org_id: Uuid,
        trigger: Trigger,
    ) -> Result<Vec<AutomationRule>, StoreError> {
        let rules = self
            .rules
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(rules
            .get(&org_id)
            .map(|org_rules| {
                org_rules
                    .iter()
                    .filter(|r| r.trigger == trigger.as_str() && r.status == RuleStatus::Active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ExecutionSink for MemoryStore {
    async fn record(&self, execution: NewExecution) -> Result<(), StoreError> {
        let mut executions = self
            .executions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        executions.push(execution);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotcrm_shared::automation::{ActionSpec, Predicate};

    #[tokio::test]
    async fn test_memory_store_filters_by_org_and_trigger() {
        let store = MemoryStore::new();
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();

        store.add_rule(MemoryStore::rule(
            org_a,
            "welcome",
            "lead.created",
            Predicate::always(),
            vec![ActionSpec::Noop],
        ));
        store.add_rule(MemoryStore::rule(
            org_a,
            "stage watch",
            "lead.stage_changed",
            Predicate::always(),
            vec![ActionSpec::Noop],
        ));
        store.add_rule(MemoryStore::rule(
            org_b,
            "other tenant",
            "lead.created",
            Predicate::always(),
            vec![ActionSpec::Noop],
        ));

        let rules = store.active_rules(org_a, Trigger::LeadCreated).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "welcome");
    }

    #[tokio::test]
    async fn test_memory_store_skips_paused_rules() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();

        let mut paused = MemoryStore::rule(
            org,
            "paused",
            "lead.created",
            Predicate::always(),
            vec![ActionSpec::Noop],
        );
        paused.status = RuleStatus::Paused;
        store.add_rule(paused);

        let rules = store.active_rules(org, Trigger::LeadCreated).await.unwrap();
        assert!(rules.is_empty());
    }
}
