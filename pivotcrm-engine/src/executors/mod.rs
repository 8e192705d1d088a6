/// Executor system for automation actions
///
/// Executors are the side-effect layer of the engine. Each action kind has
/// one executor behind the `ActionExecutor` trait; the `ExecutorRegistry`
/// dispatches on the kind tag.
///
/// # Executor Types
///
/// - **Email**: `send_email` via a pluggable `Mailer`
/// - **Notification**: `send_notification` via a pluggable `Notifier`
/// - **SetStatus** / **CreateTask**: record mutations over the database
/// - **Noop**: succeeds without side effects
/// - **Mock**: records calls for tests
pub mod email;
pub mod executor_trait;
pub mod mock;
pub mod notify;
pub mod record;

pub use email::{EmailExecutor, LogMailer, Mailer};
pub use executor_trait::{
    ActionError, ActionExecutor, ActionResult, ExecContext, ExecutorRegistry,
};
pub use mock::{ExecutedAction, MockExecutor};
pub use notify::{LogNotifier, Notifier, NotificationExecutor};
pub use record::{CreateTaskExecutor, NoopExecutor, SetStatusExecutor};

use sqlx::PgPool;
use std::sync::Arc;

/// Builds the production registry with every known action kind wired to its
/// default executor
pub fn default_registry(pool: PgPool) -> ExecutorRegistry {
    ExecutorRegistry::new()
        .register(Arc::new(EmailExecutor::new(LogMailer)))
        .register(Arc::new(NotificationExecutor::new(LogNotifier)))
        .register(Arc::new(SetStatusExecutor::new(pool.clone())))
        .register(Arc::new(CreateTaskExecutor::new(pool)))
        .register(Arc::new(NoopExecutor))
}

/// Builds a registry where every action kind routes to the given mock
pub fn mock_registry(mock: &MockExecutor) -> ExecutorRegistry {
    use pivotcrm_shared::automation::ActionSpec;

    let mut registry = ExecutorRegistry::new();
    for kind in ActionSpec::KINDS {
        registry = registry.register(Arc::new(mock.for_kind(kind)));
    }
    registry
}
