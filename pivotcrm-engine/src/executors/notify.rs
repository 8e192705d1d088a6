/// Notification action executor
///
/// Handles `send_notification` actions. Messages are posted to an internal
/// channel through the `Notifier` trait.
use crate::executors::{ActionError, ActionExecutor, ActionResult, ExecContext};
use async_trait::async_trait;
use pivotcrm_shared::automation::ActionSpec;
use tracing::info;

/// Notification delivery transport
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Posts one message to a channel
    async fn notify(&self, channel: &str, message: &str) -> ActionResult<()>;
}

/// Notifier that only logs, for environments without a provider configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, channel: &str, message: &str) -> ActionResult<()> {
        info!(channel = %channel, message = %message, "Notification posted (log transport)");
        Ok(())
    }
}

/// Executor for `send_notification` actions
pub struct NotificationExecutor<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> NotificationExecutor<N> {
    pub fn new(notifier: N) -> Self {
        NotificationExecutor { notifier }
    }
}

#[async_trait]
impl<N: Notifier> ActionExecutor for NotificationExecutor<N> {
    fn kind(&self) -> &'static str {
        "send_notification"
    }

    async fn execute(&self, action: &ActionSpec, _ctx: &ExecContext) -> ActionResult<()> {
        let ActionSpec::SendNotification { channel, message } = action else {
            return Err(ActionError::InvalidParameters(
                "send_notification executor received a different action kind".to_string(),
            ));
        };

        self.notifier.notify(channel, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivotcrm_shared::automation::EventContext;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct RecordingNotifier {
        posted: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, channel: &str, message: &str) -> ActionResult<()> {
            self.posted
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_posts_to_channel() {
        let executor = NotificationExecutor::new(RecordingNotifier {
            posted: Mutex::new(Vec::new()),
        });
        let action = ActionSpec::SendNotification {
            channel: "sales".into(),
            message: "High-budget lead in".into(),
        };
        let ctx = ExecContext {
            org_id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            trigger: "lead.created".into(),
            context: EventContext::new(),
        };

        executor.execute(&action, &ctx).await.unwrap();

        let posted = executor.notifier.posted.lock().unwrap();
        assert_eq!(posted.as_slice(), &[("sales".into(), "High-budget lead in".into())]);
    }
}
