/// AutomationExecution audit records
///
/// One row is appended per rule that matched an event, recording the context
/// snapshot and the outcome. Rows are never mutated after insert; the table is
/// an observability surface, not control flow. Skipped rules (condition false)
/// are not recorded, which bounds audit volume to matched work.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE execution_status AS ENUM ('success', 'failed');
///
/// CREATE TABLE automation_executions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     rule_id UUID NOT NULL,
///     org_id UUID NOT NULL,
///     trigger TEXT NOT NULL,
///     context JSONB NOT NULL,
///     status execution_status NOT NULL,
///     failed_action_index INTEGER,
///     error TEXT,
///     executed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_executions_org ON automation_executions (org_id, executed_at DESC);
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of one matched rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "execution_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// All actions ran to completion
    Success,

    /// An action failed; later actions in the rule were not run
    Failed,
}

impl ExecutionStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
        }
    }
}

/// Append-only audit record for one matched rule
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AutomationExecution {
    /// Unique execution ID (UUID v4)
    pub id: Uuid,

    /// Rule that matched
    pub rule_id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Trigger name of the event
    pub trigger: String,

    /// Snapshot of the event context at evaluation time
    pub context: JsonValue,

    /// Outcome
    pub status: ExecutionStatus,

    /// Index of the failing action, when status is failed
    pub failed_action_index: Option<i32>,

    /// Error text from the failing action
    pub error: Option<String>,

    /// When the rule was executed
    pub executed_at: DateTime<Utc>,
}

/// Input for appending an execution record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExecution {
    /// Rule that matched
    pub rule_id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Trigger name of the event
    pub trigger: String,

    /// Snapshot of the event context
    pub context: JsonValue,

    /// Outcome
    pub status: ExecutionStatus,

    /// Index of the failing action, when status is failed
    pub failed_action_index: Option<i32>,

    /// Error text from the failing action
    pub error: Option<String>,
}

impl NewExecution {
    /// Builds a success record
    pub fn success(rule_id: Uuid, org_id: Uuid, trigger: &str, context: JsonValue) -> Self {
        NewExecution {
            rule_id,
            org_id,
            trigger: trigger.to_string(),
            context,
            status: ExecutionStatus::Success,
            failed_action_index: None,
            error: None,
        }
    }

    /// Builds a failure record identifying the failing action
    pub fn failed(
        rule_id: Uuid,
        org_id: Uuid,
        trigger: &str,
        context: JsonValue,
        action_index: usize,
        error: String,
    ) -> Self {
        NewExecution {
            rule_id,
            org_id,
            trigger: trigger.to_string(),
            context,
            status: ExecutionStatus::Failed,
            failed_action_index: Some(action_index as i32),
            error: Some(error),
        }
    }
}

impl AutomationExecution {
    /// Appends an execution record
    ///
    /// Concurrent appends from parallel rule executions are safe; each record
    /// is independent and ordering between records does not matter.
    pub async fn record(pool: &PgPool, data: NewExecution) -> Result<Self, sqlx::Error> {
        let exec = sqlx::query_as::<_, AutomationExecution>(
            r#"
            INSERT INTO automation_executions
                (rule_id, org_id, trigger, context, status, failed_action_index, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, rule_id, org_id, trigger, context, status,
                      failed_action_index, error, executed_at
            "#,
        )
        .bind(data.rule_id)
        .bind(data.org_id)
        .bind(&data.trigger)
        .bind(&data.context)
        .bind(data.status)
        .bind(data.failed_action_index)
        .bind(&data.error)
        .fetch_one(pool)
        .await?;

        Ok(exec)
    }

    /// Lists an organization's executions, newest first
    pub async fn list_by_org(
        pool: &PgPool,
        org_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let executions = sqlx::query_as::<_, AutomationExecution>(
            r#"
            SELECT id, rule_id, org_id, trigger, context, status,
                   failed_action_index, error, executed_at
            FROM automation_executions
            WHERE org_id = $1
            ORDER BY executed_at DESC
            LIMIT $2
            "#,
        )
        .bind(org_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(executions)
    }

    /// Lists executions of a single rule, newest first
    pub async fn list_by_rule(
        pool: &PgPool,
        org_id: Uuid,
        rule_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let executions = sqlx::query_as::<_, AutomationExecution>(
            r#"
            SELECT id, rule_id, org_id, trigger, context, status,
                   failed_action_index, error, executed_at
            FROM automation_executions
            WHERE org_id = $1 AND rule_id = $2
            ORDER BY executed_at DESC
            LIMIT $3
            "#,
        )
        .bind(org_id)
        .bind(rule_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(executions)
    }
}
