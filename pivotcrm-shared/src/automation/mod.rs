/// Automation vocabulary shared between the rule store and the engine
///
/// This module defines everything an automation rule is made of: the trigger
/// catalog, the condition predicate tree, the action specifications, and the
/// domain event shape the engine consumes. The engine itself lives in the
/// `pivotcrm-engine` crate.
pub mod action;
pub mod condition;
pub mod event;
pub mod trigger;

pub use action::ActionSpec;
pub use condition::{EventContext, Predicate};
pub use event::DomainEvent;
pub use trigger::Trigger;
