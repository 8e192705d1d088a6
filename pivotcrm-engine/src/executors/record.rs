/// Record-mutating action executors
///
/// Handles `set_status` and `create_task`, the two actions that write back
/// into the domain records table. Both stay inside the event's organization:
/// `set_status` resolves its target through a tenant-scoped update, and
/// `create_task` inserts with the event's org id.
use crate::executors::{ActionError, ActionExecutor, ActionResult, ExecContext};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use pivotcrm_shared::automation::ActionSpec;
use pivotcrm_shared::models::record::{CreateRecord, DomainRecord, RecordKind};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Default context field holding the target record id
const DEFAULT_RECORD_FIELD: &str = "record_id";

/// Executor for `set_status` actions
pub struct SetStatusExecutor {
    pool: PgPool,
}

impl SetStatusExecutor {
    pub fn new(pool: PgPool) -> Self {
        SetStatusExecutor { pool }
    }
}

#[async_trait]
impl ActionExecutor for SetStatusExecutor {
    fn kind(&self) -> &'static str {
        "set_status"
    }

    async fn execute(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()> {
        let ActionSpec::SetStatus {
            record_field,
            status,
        } = action
        else {
            return Err(ActionError::InvalidParameters(
                "set_status executor received a different action kind".to_string(),
            ));
        };

        let field = record_field.as_deref().unwrap_or(DEFAULT_RECORD_FIELD);
        let raw = ctx.str_field(field).ok_or_else(|| {
            ActionError::TargetNotFound(format!(
                "record field '{}' missing from event context",
                field
            ))
        })?;
        let record_id = Uuid::parse_str(raw).map_err(|_| {
            ActionError::InvalidParameters(format!("field '{}' is not a record id", field))
        })?;

        let updated =
            DomainRecord::update_status(&self.pool, ctx.org_id, record_id, status).await?;

        match updated {
            Some(record) => {
                info!(
                    record_id = %record.id,
                    status = %status,
                    "Record status set by automation"
                );
                Ok(())
            }
            None => Err(ActionError::TargetNotFound(format!(
                "record {} not found in organization",
                record_id
            ))),
        }
    }
}

/// Executor for `create_task` actions
pub struct CreateTaskExecutor {
    pool: PgPool,
}

impl CreateTaskExecutor {
    pub fn new(pool: PgPool) -> Self {
        CreateTaskExecutor { pool }
    }
}

#[async_trait]
impl ActionExecutor for CreateTaskExecutor {
    fn kind(&self) -> &'static str {
        "create_task"
    }

    async fn execute(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()> {
        let ActionSpec::CreateTask { title, due_in_days } = action else {
            return Err(ActionError::InvalidParameters(
                "create_task executor received a different action kind".to_string(),
            ));
        };

        let due_at = due_in_days.map(|days| Utc::now() + Duration::days(days));

        let task = DomainRecord::create(
            &self.pool,
            CreateRecord {
                org_id: ctx.org_id,
                kind: RecordKind::Task,
                status: "open".to_string(),
                payload: json!({
                    "title": title,
                    "due_at": due_at,
                    "created_by_rule": ctx.rule_id,
                }),
            },
        )
        .await?;

        info!(task_id = %task.id, title = %title, "Task created by automation");
        Ok(())
    }
}

/// Executor for `noop` actions
///
/// Succeeds without side effects. Lets users dry-run a rule's condition in
/// production and watch the audit log.
pub struct NoopExecutor;

#[async_trait]
impl ActionExecutor for NoopExecutor {
    fn kind(&self) -> &'static str {
        "noop"
    }

    async fn execute(&self, _action: &ActionSpec, _ctx: &ExecContext) -> ActionResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotcrm_shared::automation::EventContext;

    #[tokio::test]
    async fn test_noop_always_succeeds() {
        let ctx = ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context: EventContext::new(),
        };
        assert!(NoopExecutor.execute(&ActionSpec::Noop, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_status_requires_record_field() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pivotcrm_test")
            .unwrap();
        let executor = SetStatusExecutor::new(pool);

        let action = ActionSpec::SetStatus {
            record_field: None,
            status: "contacted".into(),
        };
        let ctx = ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context: EventContext::new(),
        };

        // Fails before touching the database: no record_id in the context.
        let result = executor.execute(&action, &ctx).await;
        assert!(matches!(result, Err(ActionError::TargetNotFound(_))));
    }

    #[tokio::test]
    async fn test_set_status_rejects_malformed_id() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pivotcrm_test")
            .unwrap();
        let executor = SetStatusExecutor::new(pool);

        let action = ActionSpec::SetStatus {
            record_field: None,
            status: "contacted".into(),
        };
        let mut context = EventContext::new();
        context.insert("record_id".into(), json!("not-a-uuid"));
        let ctx = ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context,
        };

        let result = executor.execute(&action, &ctx).await;
        assert!(matches!(result, Err(ActionError::InvalidParameters(_))));
    }
}
