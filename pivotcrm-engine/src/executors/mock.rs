/// Mock executor for testing
///
/// Records every action it is asked to execute and can be configured to fail
/// on specific kinds, letting tests drive the engine's abort-on-failure path
/// without any external side effects.
///
/// Registered under every known action kind, so a single instance stands in
/// for the whole side-effect layer.
use crate::executors::{ActionError, ActionExecutor, ActionResult, ExecContext};
use async_trait::async_trait;
use pivotcrm_shared::automation::ActionSpec;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One recorded execution call
#[derive(Debug, Clone)]
pub struct ExecutedAction {
    /// Rule the action belonged to
    pub rule_id: Uuid,

    /// The action as the engine dispatched it
    pub action: ActionSpec,
}

/// Shared recording state, cloned into each per-kind registration
#[derive(Default)]
struct MockState {
    executed: Vec<ExecutedAction>,
    fail_kinds: HashSet<&'static str>,
}

/// Mock executor implementation
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
    kind: &'static str,
}

impl MockExecutor {
    /// Creates a fresh mock with no recorded calls
    pub fn new() -> Self {
        MockExecutor {
            state: Arc::new(Mutex::new(MockState::default())),
            kind: "noop",
        }
    }

    /// A handle registered under a specific action kind, sharing this mock's
    /// recording state
    pub fn for_kind(&self, kind: &'static str) -> Self {
        MockExecutor {
            state: Arc::clone(&self.state),
            kind,
        }
    }

    /// Makes every action of the given kind fail
    pub fn fail_on(&self, kind: &'static str) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_kinds.insert(kind);
        }
    }

    /// All actions executed so far, in dispatch order
    pub fn executed(&self) -> Vec<ExecutedAction> {
        self.state
            .lock()
            .map(|state| state.executed.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ActionExecutor for MockExecutor {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn execute(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ActionError::ExecutionFailed("mock state poisoned".to_string()))?;

        if state.fail_kinds.contains(action.kind()) {
            return Err(ActionError::ExecutionFailed(format!(
                "mock failure for kind '{}'",
                action.kind()
            )));
        }

        state.executed.push(ExecutedAction {
            rule_id: ctx.rule_id,
            action: action.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotcrm_shared::automation::EventContext;

    fn ctx() -> ExecContext {
        ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context: EventContext::new(),
        }
    }

    #[tokio::test]
    async fn test_records_in_order() {
        let mock = MockExecutor::new();
        let ctx = ctx();

        mock.execute(&ActionSpec::Noop, &ctx).await.unwrap();
        mock.execute(
            &ActionSpec::SendNotification {
                channel: "sales".into(),
                message: "hi".into(),
            },
            &ctx,
        )
        .await
        .unwrap();

        let executed = mock.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].action.kind(), "noop");
        assert_eq!(executed[1].action.kind(), "send_notification");
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let mock = MockExecutor::new();
        mock.fail_on("noop");

        let result = mock.execute(&ActionSpec::Noop, &ctx()).await;
        assert!(matches!(result, Err(ActionError::ExecutionFailed(_))));
        assert!(mock.executed().is_empty());
    }

    #[tokio::test]
    async fn test_for_kind_shares_state() {
        let mock = MockExecutor::new();
        let email_handle = mock.for_kind("send_email");

        email_handle
            .execute(
                &ActionSpec::SendEmail {
                    template: "welcome".into(),
                    to_field: None,
                },
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(mock.executed().len(), 1);
        assert_eq!(email_handle.kind(), "send_email");
    }
}
