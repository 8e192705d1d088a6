/// Email action executor
///
/// Handles `send_email` actions. The recipient address is resolved from the
/// event context via the action's `to_field` (defaulting to `email`); a
/// missing or non-string field fails the action. Delivery goes through the
/// `Mailer` trait so the transport can be swapped without touching the
/// executor.
use crate::executors::{ActionError, ActionExecutor, ActionResult, ExecContext};
use async_trait::async_trait;
use pivotcrm_shared::automation::ActionSpec;
use tracing::info;

/// Default context field holding the recipient address
const DEFAULT_TO_FIELD: &str = "email";

/// Email delivery transport
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one templated email
    async fn send(&self, to: &str, template: &str) -> ActionResult<()>;
}

/// Mailer that only logs, for environments without a provider configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: &str) -> ActionResult<()> {
        info!(to = %to, template = %template, "Email queued (log transport)");
        Ok(())
    }
}

/// Executor for `send_email` actions
pub struct EmailExecutor<M: Mailer> {
    mailer: M,
}

impl<M: Mailer> EmailExecutor<M> {
    pub fn new(mailer: M) -> Self {
        EmailExecutor { mailer }
    }
}

#[async_trait]
impl<M: Mailer> ActionExecutor for EmailExecutor<M> {
    fn kind(&self) -> &'static str {
        "send_email"
    }

    async fn execute(&self, action: &ActionSpec, ctx: &ExecContext) -> ActionResult<()> {
        let ActionSpec::SendEmail { template, to_field } = action else {
            return Err(ActionError::InvalidParameters(
                "send_email executor received a different action kind".to_string(),
            ));
        };

        let field = to_field.as_deref().unwrap_or(DEFAULT_TO_FIELD);
        let to = ctx.str_field(field).ok_or_else(|| {
            ActionError::TargetNotFound(format!(
                "recipient field '{}' missing from event context",
                field
            ))
        })?;

        self.mailer.send(to, template).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotcrm_shared::automation::EventContext;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, template: &str) -> ActionResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), template.to_string()));
            Ok(())
        }
    }

    fn ctx_with(field: &str, value: &str) -> ExecContext {
        let mut context = EventContext::new();
        context.insert(field.to_string(), json!(value));
        ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context,
        }
    }

    #[tokio::test]
    async fn test_resolves_default_to_field() {
        let executor = EmailExecutor::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
        });
        let action = ActionSpec::SendEmail {
            template: "welcome".into(),
            to_field: None,
        };

        executor
            .execute(&action, &ctx_with("email", "ana@example.com"))
            .await
            .unwrap();

        let sent = executor.mailer.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[("ana@example.com".into(), "welcome".into())]);
    }

    #[tokio::test]
    async fn test_resolves_custom_to_field() {
        let executor = EmailExecutor::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
        });
        let action = ActionSpec::SendEmail {
            template: "follow-up".into(),
            to_field: Some("owner_email".into()),
        };

        executor
            .execute(&action, &ctx_with("owner_email", "rep@example.com"))
            .await
            .unwrap();

        let sent = executor.mailer.sent.lock().unwrap();
        assert_eq!(sent[0].0, "rep@example.com");
    }

    #[tokio::test]
    async fn test_missing_recipient_field_fails() {
        let executor = EmailExecutor::new(LogMailer);
        let action = ActionSpec::SendEmail {
            template: "welcome".into(),
            to_field: None,
        };

        let result = executor
            .execute(&action, &ctx_with("unrelated", "x"))
            .await;
        assert!(matches!(result, Err(ActionError::TargetNotFound(_))));
    }
}
