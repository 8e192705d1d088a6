/// Trigger catalog for automation rules
///
/// Triggers are the closed set of domain event names a rule can listen for.
/// Rules referencing a trigger outside this catalog are rejected at creation
/// time, so the engine never has to handle an unknown trigger at execution
/// time.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain events an automation rule can fire on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// A lead was created
    #[serde(rename = "lead.created")]
    LeadCreated,

    /// A lead's fields changed
    #[serde(rename = "lead.updated")]
    LeadUpdated,

    /// A lead moved to a different pipeline stage
    #[serde(rename = "lead.stage_changed")]
    LeadStageChanged,

    /// A task was marked completed
    #[serde(rename = "task.completed")]
    TaskCompleted,

    /// A campaign went live
    #[serde(rename = "campaign.launched")]
    CampaignLaunched,

    /// A property listing was published
    #[serde(rename = "property.listed")]
    PropertyListed,

    /// Any record was deleted
    #[serde(rename = "record.deleted")]
    RecordDeleted,
}

impl Trigger {
    /// All triggers in the catalog
    pub const ALL: [Trigger; 7] = [
        Trigger::LeadCreated,
        Trigger::LeadUpdated,
        Trigger::LeadStageChanged,
        Trigger::TaskCompleted,
        Trigger::CampaignLaunched,
        Trigger::PropertyListed,
        Trigger::RecordDeleted,
    ];

    /// The wire/storage name of the trigger
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::LeadCreated => "lead.created",
            Trigger::LeadUpdated => "lead.updated",
            Trigger::LeadStageChanged => "lead.stage_changed",
            Trigger::TaskCompleted => "task.completed",
            Trigger::CampaignLaunched => "campaign.launched",
            Trigger::PropertyListed => "property.listed",
            Trigger::RecordDeleted => "record.deleted",
        }
    }

    /// Parses a trigger name, returning None for names outside the catalog
    pub fn parse(s: &str) -> Option<Self> {
        Trigger::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_triggers() {
        for trigger in Trigger::ALL {
            assert_eq!(Trigger::parse(trigger.as_str()), Some(trigger));
        }
    }

    #[test]
    fn test_parse_unknown_trigger() {
        assert_eq!(Trigger::parse("invoice.paid"), None);
        assert_eq!(Trigger::parse(""), None);
    }

    #[test]
    fn test_serde_uses_dotted_names() {
        let json = serde_json::to_string(&Trigger::LeadCreated).unwrap();
        assert_eq!(json, "\"lead.created\"");
        let trigger: Trigger = serde_json::from_str("\"task.completed\"").unwrap();
        assert_eq!(trigger, Trigger::TaskCompleted);
    }
}
