/// Core ActionExecutor trait and registry
///
/// Executors are the side-effect layer of the automation engine. Each action
/// kind maps to one executor; the registry dispatches on the kind tag. The
/// engine itself never performs side effects directly, so tests swap the
/// registry for one backed by mocks.
///
/// # Executor Contract
///
/// All executors must:
/// 1. Implement the `ActionExecutor` trait (async)
/// 2. Accept an `ExecContext` with the event context and rule metadata
/// 3. Return `Ok(())` on success or a typed error on failure
/// 4. Be safe to call concurrently from parallel rule executions
///
/// # Example
///
/// ```no_run
/// use pivotcrm_engine::executors::{ActionExecutor, ActionResult, ExecContext};
/// use async_trait::async_trait;
/// use pivotcrm_shared::automation::ActionSpec;
///
/// struct MyExecutor;
///
/// #[async_trait]
/// impl ActionExecutor for MyExecutor {
///     fn kind(&self) -> &'static str {
///         "noop"
///     }
///
///     async fn execute(&self, _action: &ActionSpec, _ctx: &ExecContext) -> ActionResult<()> {
///         Ok(())
///     }
/// }
/// ```
use async_trait::async_trait;
use pivotcrm_shared::automation::{ActionSpec, EventContext};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Executor error types
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The action referenced a field or resource that does not exist
    #[error("Action target not found: {0}")]
    TargetNotFound(String),

    /// The action's parameters were invalid at execution time
    #[error("Invalid action parameters: {0}")]
    InvalidParameters(String),

    /// No executor is registered for the action kind
    #[error("No executor registered for action kind '{0}'")]
    UnknownKind(String),

    /// The side effect itself failed
    #[error("Action execution failed: {0}")]
    ExecutionFailed(String),

    /// Database error while executing the action
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Executor result type alias
pub type ActionResult<T> = Result<T, ActionError>;

/// Execution context handed to every executor
///
/// Carries the matched rule's identity and a read-only view of the event
/// context. Executors resolve field references (like an email recipient
/// field) against the context.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Organization the event belongs to
    pub org_id: Uuid,

    /// Rule being executed
    pub rule_id: Uuid,

    /// Trigger name of the event
    pub trigger: String,

    /// Event context fields
    pub context: EventContext,
}

impl ExecContext {
    /// Looks up a string field in the event context
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.context.get(field).and_then(|v| v.as_str())
    }
}

/// Core ActionExecutor trait
///
/// One implementation per action kind. Executors must be cheap to share;
/// the registry holds them behind `Arc`.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// The action kind this executor handles
    ///
    /// Used for registry lookup and logging.
    fn kind(&self) -> &'static str;

    /// Executes one action
    ///
    /// # Errors
    ///
    /// Returns an error if the side effect fails; the engine records the
    /// failure and skips the rule's remaining actions.
    async fn execute(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()>;
}

/// Registry mapping action kinds to executors
///
/// Built once at startup and shared across the engine. Dispatching an action
/// whose kind has no entry is an execution failure for that rule, never a
/// panic.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<&'static str, Arc<dyn ActionExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an executor under its own kind
    pub fn register(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executors.insert(executor.kind(), executor);
        self
    }

    /// Looks up the executor for an action kind
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ActionExecutor>> {
        self.executors.get(kind)
    }

    /// Dispatches one action to its executor
    ///
    /// # Errors
    ///
    /// Returns `ActionError::UnknownKind` when no executor is registered for
    /// the action's kind, or the executor's own error on failure
    pub async fn dispatch(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()> {
        let kind = action.kind();
        let executor = self
            .executors
            .get(kind)
            .ok_or_else(|| ActionError::UnknownKind(kind.to_string()))?;

        executor.execute(action, ctx).await
    }

    /// Registered action kinds, for diagnostics
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.executors.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NeverExecutor;

    #[async_trait]
    impl ActionExecutor for NeverExecutor {
        fn kind(&self) -> &'static str {
            "send_email"
        }

        async fn execute(&self, _action: &ActionSpec, _ctx: &ExecContext) -> ActionResult<()> {
            Err(ActionError::ExecutionFailed("boom".into()))
        }
    }

    fn ctx() -> ExecContext {
        let mut context = EventContext::new();
        context.insert("owner_email".into(), json!("ana@example.com"));
        ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context,
        }
    }

    #[test]
    fn test_str_field_lookup() {
        let ctx = ctx();
        assert_eq!(ctx.str_field("owner_email"), Some("ana@example.com"));
        assert_eq!(ctx.str_field("missing"), None);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_kind() {
        let registry = ExecutorRegistry::new();
        let action = ActionSpec::Noop;

        let result = registry.dispatch(&action, &ctx()).await;
        assert!(matches!(result, Err(ActionError::UnknownKind(k)) if k == "noop"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_kind() {
        let registry = ExecutorRegistry::new().register(Arc::new(NeverExecutor));
        let action = ActionSpec::SendEmail {
            template: "welcome".into(),
            to_field: None,
        };

        let result = registry.dispatch(&action, &ctx()).await;
        assert!(matches!(result, Err(ActionError::ExecutionFailed(_))));
    }

    #[test]
    fn test_kinds_sorted() {
        let registry = ExecutorRegistry::new().register(Arc::new(NeverExecutor));
        assert_eq!(registry.kinds(), vec!["send_email"]);
    }
}
