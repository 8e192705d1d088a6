/// Domain events handed to the automation engine
///
/// Route handlers package the triggering entity and actor into a flat context
/// map and dispatch the event after their own write commits. The engine treats
/// the context as opaque except for the fields rule conditions reference;
/// unknown fields are ignored, missing referenced fields evaluate to false.
use crate::automation::condition::EventContext;
use crate::automation::trigger::Trigger;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A domain event scoped to one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Which trigger this event corresponds to
    pub trigger: Trigger,

    /// Owning organization; rule lookup is always scoped to this tenant
    pub org_id: Uuid,

    /// Field name to value for the triggering entity and actor
    pub context: EventContext,
}

impl DomainEvent {
    /// Creates an event with an empty context
    pub fn new(trigger: Trigger, org_id: Uuid) -> Self {
        DomainEvent {
            trigger,
            org_id,
            context: EventContext::new(),
        }
    }

    /// Adds a context field, builder-style
    pub fn with(mut self, field: &str, value: JsonValue) -> Self {
        self.context.insert(field.to_string(), value);
        self
    }

    /// Merges the top-level fields of a JSON object into the context
    ///
    /// Non-object values are ignored; existing fields are not overwritten, so
    /// system fields set by the caller win over payload fields.
    pub fn merge_payload(mut self, payload: &JsonValue) -> Self {
        if let Some(object) = payload.as_object() {
            for (key, value) in object {
                self.context
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        self
    }
}
