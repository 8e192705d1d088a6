/// AutomationRule model and tenant-scoped store operations
///
/// Rules belong to one organization; every query here takes the owning org id
/// and a foreign rule id is indistinguishable from a missing one. Creation and
/// update validate the trigger against the catalog and each action spec, so
/// the engine never sees a malformed rule.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE rule_status AS ENUM ('active', 'paused');
///
/// CREATE TABLE automation_rules (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     name VARCHAR(255) NOT NULL,
///     trigger TEXT NOT NULL,
///     condition JSONB NOT NULL,
///     actions JSONB NOT NULL,
///     status rule_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_rules_org_trigger ON automation_rules (org_id, trigger)
///     WHERE status = 'active';
/// ```
use crate::automation::{ActionSpec, Predicate, Trigger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Errors from rule store operations
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Malformed rule definition, rejected at creation/update time
    #[error("Invalid rule: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Whether a rule participates in event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rule_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// Evaluated on every matching event
    Active,

    /// Retained but never evaluated
    Paused,
}

impl RuleStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Active => "active",
            RuleStatus::Paused => "paused",
        }
    }
}

/// Automation rule: trigger, condition, ordered actions
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutomationRule {
    /// Unique rule ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Human-readable rule name
    pub name: String,

    /// Trigger name from the catalog (stored as text)
    pub trigger: String,

    /// Condition predicate tree
    pub condition: Json<Predicate>,

    /// Actions executed in declared order when the condition holds
    pub actions: Json<Vec<ActionSpec>>,

    /// Active or paused
    pub status: RuleStatus,

    /// When the rule was created
    pub created_at: DateTime<Utc>,

    /// When the rule was last updated
    pub updated_at: DateTime<Utc>,
}

impl AutomationRule {
    /// Parsed trigger
    ///
    /// Creation validates the trigger, so this only returns None for rows
    /// written before a trigger was retired from the catalog.
    pub fn parsed_trigger(&self) -> Option<Trigger> {
        Trigger::parse(&self.trigger)
    }
}

/// Input for creating a new rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRule {
    /// Owning organization
    pub org_id: Uuid,

    /// Rule name
    pub name: String,

    /// Trigger name; must be in the catalog
    pub trigger: String,

    /// Condition predicate tree
    pub condition: Predicate,

    /// Ordered action list; must be non-empty and each spec valid
    pub actions: Vec<ActionSpec>,
}

/// Input for updating an existing rule's definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRule {
    /// New name
    pub name: Option<String>,

    /// New trigger; must be in the catalog
    pub trigger: Option<String>,

    /// New condition
    pub condition: Option<Predicate>,

    /// New action list
    pub actions: Option<Vec<ActionSpec>>,
}

/// Validates a trigger name and action list for rule creation/update
///
/// Unknown triggers and malformed actions are rejected here, at definition
/// time, never at execution time.
pub fn validate_rule_definition(trigger: &str, actions: &[ActionSpec]) -> Result<(), RuleError> {
    if Trigger::parse(trigger).is_none() {
        return Err(RuleError::Validation(format!(
            "Unknown trigger: {}",
            trigger
        )));
    }

    if actions.is_empty() {
        return Err(RuleError::Validation(
            "A rule requires at least one action".to_string(),
        ));
    }

    for (index, action) in actions.iter().enumerate() {
        action
            .validate()
            .map_err(|e| RuleError::Validation(format!("Action {}: {}", index, e)))?;
    }

    Ok(())
}

impl AutomationRule {
    /// Creates a rule after validating its definition
    ///
    /// # Errors
    ///
    /// Returns `RuleError::Validation` for unknown triggers, empty action
    /// lists, or malformed action parameters.
    pub async fn create(pool: &PgPool, data: CreateRule) -> Result<Self, RuleError> {
        validate_rule_definition(&data.trigger, &data.actions)?;

        let rule = sqlx::query_as::<_, AutomationRule>(
            r#"
            INSERT INTO automation_rules (org_id, name, trigger, condition, actions, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING id, org_id, name, trigger, condition, actions, status,
                      created_at, updated_at
            "#,
        )
        .bind(data.org_id)
        .bind(&data.name)
        .bind(&data.trigger)
        .bind(Json(&data.condition))
        .bind(Json(&data.actions))
        .fetch_one(pool)
        .await?;

        Ok(rule)
    }

    /// Lists an organization's rules, oldest first
    pub async fn list_by_org(pool: &PgPool, org_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let rules = sqlx::query_as::<_, AutomationRule>(
            r#"
            SELECT id, org_id, name, trigger, condition, actions, status,
                   created_at, updated_at
            FROM automation_rules
            WHERE org_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(rules)
    }

    /// Lists ACTIVE rules for one organization and trigger
    ///
    /// This is the engine's hot path; the partial index on
    /// (org_id, trigger) covers it.
    pub async fn list_active_for_trigger(
        pool: &PgPool,
        org_id: Uuid,
        trigger: Trigger,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let rules = sqlx::query_as::<_, AutomationRule>(
            r#"
            SELECT id, org_id, name, trigger, condition, actions, status,
                   created_at, updated_at
            FROM automation_rules
            WHERE org_id = $1 AND trigger = $2 AND status = 'active'
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .bind(trigger.as_str())
        .fetch_all(pool)
        .await?;

        Ok(rules)
    }

    /// Finds a rule within the caller's organization
    ///
    /// A rule owned by another organization and a rule that does not exist
    /// both return None; callers must not distinguish the two.
    pub async fn find_scoped(
        pool: &PgPool,
        org_id: Uuid,
        rule_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let rule = sqlx::query_as::<_, AutomationRule>(
            r#"
            SELECT id, org_id, name, trigger, condition, actions, status,
                   created_at, updated_at
            FROM automation_rules
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(rule_id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(rule)
    }

    /// Updates a rule's definition within the caller's organization
    ///
    /// Unset fields keep their current value. Validation runs against the
    /// merged definition.
    pub async fn update(
        pool: &PgPool,
        org_id: Uuid,
        rule_id: Uuid,
        data: UpdateRule,
    ) -> Result<Option<Self>, RuleError> {
        let Some(current) = Self::find_scoped(pool, org_id, rule_id).await? else {
            return Ok(None);
        };

        let name = data.name.unwrap_or(current.name);
        let trigger = data.trigger.unwrap_or(current.trigger);
        let condition = data.condition.unwrap_or(current.condition.0);
        let actions = data.actions.unwrap_or(current.actions.0);

        validate_rule_definition(&trigger, &actions)?;

        let rule = sqlx::query_as::<_, AutomationRule>(
            r#"
            UPDATE automation_rules
            SET name = $3, trigger = $4, condition = $5, actions = $6, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, name, trigger, condition, actions, status,
                      created_at, updated_at
            "#,
        )
        .bind(rule_id)
        .bind(org_id)
        .bind(&name)
        .bind(&trigger)
        .bind(Json(&condition))
        .bind(Json(&actions))
        .fetch_optional(pool)
        .await?;

        Ok(rule)
    }

    /// Toggles a rule between active and paused
    pub async fn set_status(
        pool: &PgPool,
        org_id: Uuid,
        rule_id: Uuid,
        status: RuleStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let rule = sqlx::query_as::<_, AutomationRule>(
            r#"
            UPDATE automation_rules
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, name, trigger, condition, actions, status,
                      created_at, updated_at
            "#,
        )
        .bind(rule_id)
        .bind(org_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(rule)
    }

    /// Deletes a rule within the caller's organization
    ///
    /// Returns true if a rule was deleted. Foreign and missing rule ids both
    /// return false.
    pub async fn delete_scoped(
        pool: &PgPool,
        org_id: Uuid,
        rule_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM automation_rules WHERE id = $1 AND org_id = $2")
            .bind(rule_id)
            .bind(org_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
