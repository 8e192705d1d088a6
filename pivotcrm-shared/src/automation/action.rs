/// Action specifications for automation rules
///
/// Actions are the closed set of side effects a rule can declare. Each variant
/// carries strongly-typed parameters and validates itself at rule-creation
/// time; the engine only ever executes specs that passed validation.
///
/// # Persistence shape
///
/// Actions serialize with a `type` tag, e.g.:
///
/// ```json
/// { "type": "send_email", "template": "follow-up", "to_field": "email" }
/// ```
use serde::{Deserialize, Serialize};

/// A single declared side effect executed when a rule matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Send a templated email to an address taken from the event context
    SendEmail {
        /// Email template identifier
        template: String,

        /// Context field holding the recipient address (default: "email")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_field: Option<String>,
    },

    /// Post a message to an internal notification channel
    SendNotification {
        /// Channel identifier (e.g. "sales", "ops")
        channel: String,

        /// Message body; may reference context fields for display only
        message: String,
    },

    /// Set the status of the record identified by a context field
    SetStatus {
        /// Context field holding the target record id (default: "record_id")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record_field: Option<String>,

        /// Status to set
        status: String,
    },

    /// Create a follow-up task record in the same organization
    CreateTask {
        /// Task title
        title: String,

        /// Days until the task is due, from execution time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_in_days: Option<i64>,
    },

    /// No side effect; useful for testing a rule's condition in production
    Noop,
}

impl ActionSpec {
    /// The wire name of this action kind, used for executor registry lookup
    pub fn kind(&self) -> &'static str {
        match self {
            ActionSpec::SendEmail { .. } => "send_email",
            ActionSpec::SendNotification { .. } => "send_notification",
            ActionSpec::SetStatus { .. } => "set_status",
            ActionSpec::CreateTask { .. } => "create_task",
            ActionSpec::Noop => "noop",
        }
    }

    /// All action kinds the engine knows how to execute
    pub const KINDS: [&'static str; 5] = [
        "send_email",
        "send_notification",
        "set_status",
        "create_task",
        "noop",
    ];

    /// Validates the spec's parameters
    ///
    /// Called at rule creation; execution assumes specs are valid.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ActionSpec::SendEmail { template, .. } => {
                if template.trim().is_empty() {
                    return Err("send_email requires a non-empty template".to_string());
                }
            }
            ActionSpec::SendNotification { channel, message } => {
                if channel.trim().is_empty() {
                    return Err("send_notification requires a non-empty channel".to_string());
                }
                if message.trim().is_empty() {
                    return Err("send_notification requires a non-empty message".to_string());
                }
            }
            ActionSpec::SetStatus { status, .. } => {
                if status.trim().is_empty() {
                    return Err("set_status requires a non-empty status".to_string());
                }
            }
            ActionSpec::CreateTask { title, due_in_days } => {
                if title.trim().is_empty() {
                    return Err("create_task requires a non-empty title".to_string());
                }
                if let Some(days) = due_in_days {
                    if *days < 0 {
                        return Err("create_task due_in_days must be >= 0".to_string());
                    }
                }
            }
            ActionSpec::Noop => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        let email = ActionSpec::SendEmail {
            template: "follow-up".into(),
            to_field: None,
        };
        assert_eq!(email.kind(), "send_email");
        assert_eq!(ActionSpec::Noop.kind(), "noop");
        assert!(ActionSpec::KINDS.contains(&email.kind()));
    }

    #[test]
    fn test_validate_rejects_empty_params() {
        let bad = ActionSpec::SendEmail {
            template: "  ".into(),
            to_field: None,
        };
        assert!(bad.validate().is_err());

        let bad = ActionSpec::SendNotification {
            channel: "sales".into(),
            message: String::new(),
        };
        assert!(bad.validate().is_err());

        let bad = ActionSpec::CreateTask {
            title: "call back".into(),
            due_in_days: Some(-1),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let ok = ActionSpec::SetStatus {
            record_field: Some("lead_id".into()),
            status: "contacted".into(),
        };
        assert!(ok.validate().is_ok());
        assert!(ActionSpec::Noop.validate().is_ok());
    }

    #[test]
    fn test_serde_tagged_shape() {
        let spec = ActionSpec::SendEmail {
            template: "follow-up".into(),
            to_field: Some("email".into()),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({"type": "send_email", "template": "follow-up", "to_field": "email"})
        );

        let back: ActionSpec = serde_json::from_value(value).unwrap();
        assert_eq!(back, spec);
    }

    #[test]
    fn test_unknown_type_fails_deserialization() {
        let result: Result<ActionSpec, _> =
            serde_json::from_value(json!({"type": "launch_rocket"}));
        assert!(result.is_err());
    }
}
