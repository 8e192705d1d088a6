/// In-process event dispatcher
///
/// Decouples API write paths from automation work. Handlers emit a
/// `DomainEvent` after their own transaction commits; the dispatcher queues
/// it on an unbounded channel and a background task drains the queue through
/// the engine. Emission is fire-and-forget: a full engine or a failing rule
/// can never fail the request that produced the event.
///
/// # Shutdown
///
/// The background task listens on a `CancellationToken`. On shutdown it stops
/// accepting events and finishes the one it is processing.
use crate::engine::AutomationEngine;
use crate::store::{ExecutionSink, RuleSource};
use pivotcrm_shared::automation::DomainEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cheap cloneable handle used by API handlers to emit events
#[derive(Clone)]
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl EventDispatcher {
    /// Queues an event for the engine
    ///
    /// Never blocks and never errors toward the caller. If the dispatcher
    /// has shut down the event is dropped with a log line.
    pub fn dispatch(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            error!("Event dispatcher is shut down; dropping event");
        }
    }
}

/// Handle to the running dispatcher task
pub struct DispatcherHandle {
    shutdown: CancellationToken,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Signals shutdown and waits for the task to drain
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.join.await {
            error!(error = %e, "Dispatcher task panicked during shutdown");
        }
    }
}

/// Spawns the dispatcher background task
///
/// Returns the emit handle for API state and the task handle for shutdown.
pub fn spawn_dispatcher<S>(
    engine: AutomationEngine<S>,
) -> (EventDispatcher, DispatcherHandle)
where
    S: RuleSource + ExecutionSink + Send + Sync + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<DomainEvent>();
    let shutdown = CancellationToken::new();
    let task_token = shutdown.clone();
    let engine = Arc::new(engine);

    let join = tokio::spawn(async move {
        info!("Automation dispatcher started");
        loop {
            tokio::select! {
                _ = task_token.cancelled() => {
                    info!("Automation dispatcher shutting down");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if let Err(e) = engine.handle_event(&event).await {
                        error!(
                            trigger = %event.trigger.as_str(),
                            org_id = %event.org_id,
                            error = %e,
                            "Automation engine failed to handle event"
                        );
                    }
                }
            }
        }
    });

    (EventDispatcher { tx }, DispatcherHandle { shutdown, join })
}
