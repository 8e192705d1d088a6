/// Capability tags and the static Capability Table
///
/// A capability is an atomic permission tag gating one kind of action. The
/// set a user holds is a pure function of their membership role and their
/// organization's plan tier: the role decides what they may do, the plan
/// decides what the organization has paid for, and the grant is the
/// intersection of the two. Any combination not covered by the tables below
/// resolves to the empty set — the table fails closed, it never errors.
///
/// Capabilities are a closed, versioned set. Adding one is additive and
/// backward compatible; removing one is breaking and must be coordinated with
/// every table entry referencing it.
use crate::models::membership::MembershipRole;
use crate::models::record::RecordKind;
use crate::models::subscription::PlanTier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Atomic permission tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// View leads
    #[serde(rename = "leads.read")]
    LeadsRead,

    /// Create and edit leads
    #[serde(rename = "leads.write")]
    LeadsWrite,

    /// Export lead data
    #[serde(rename = "leads.export")]
    LeadsExport,

    /// View tasks
    #[serde(rename = "tasks.read")]
    TasksRead,

    /// Create and edit tasks
    #[serde(rename = "tasks.write")]
    TasksWrite,

    /// View campaigns
    #[serde(rename = "campaigns.read")]
    CampaignsRead,

    /// Create and edit campaigns
    #[serde(rename = "campaigns.write")]
    CampaignsWrite,

    /// View property listings
    #[serde(rename = "properties.read")]
    PropertiesRead,

    /// Create and edit property listings
    #[serde(rename = "properties.write")]
    PropertiesWrite,

    /// Create, edit, pause, and delete automation rules
    #[serde(rename = "automations.manage")]
    AutomationsManage,

    /// Invite, remove, and change roles of members
    #[serde(rename = "members.manage")]
    MembersManage,

    /// Change the subscription and archive the organization
    #[serde(rename = "billing.manage")]
    BillingManage,

    /// View dashboards and the automation audit log
    #[serde(rename = "reports.view")]
    ReportsView,
}

impl Capability {
    /// The wire name of the capability tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LeadsRead => "leads.read",
            Capability::LeadsWrite => "leads.write",
            Capability::LeadsExport => "leads.export",
            Capability::TasksRead => "tasks.read",
            Capability::TasksWrite => "tasks.write",
            Capability::CampaignsRead => "campaigns.read",
            Capability::CampaignsWrite => "campaigns.write",
            Capability::PropertiesRead => "properties.read",
            Capability::PropertiesWrite => "properties.write",
            Capability::AutomationsManage => "automations.manage",
            Capability::MembersManage => "members.manage",
            Capability::BillingManage => "billing.manage",
            Capability::ReportsView => "reports.view",
        }
    }

    /// Parses a capability from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "leads.read" => Some(Capability::LeadsRead),
            "leads.write" => Some(Capability::LeadsWrite),
            "leads.export" => Some(Capability::LeadsExport),
            "tasks.read" => Some(Capability::TasksRead),
            "tasks.write" => Some(Capability::TasksWrite),
            "campaigns.read" => Some(Capability::CampaignsRead),
            "campaigns.write" => Some(Capability::CampaignsWrite),
            "properties.read" => Some(Capability::PropertiesRead),
            "properties.write" => Some(Capability::PropertiesWrite),
            "automations.manage" => Some(Capability::AutomationsManage),
            "members.manage" => Some(Capability::MembersManage),
            "billing.manage" => Some(Capability::BillingManage),
            "reports.view" => Some(Capability::ReportsView),
            _ => None,
        }
    }

    /// The capability required to read records of a kind
    pub fn read_for(kind: RecordKind) -> Capability {
        match kind {
            RecordKind::Lead => Capability::LeadsRead,
            RecordKind::Task => Capability::TasksRead,
            RecordKind::Campaign => Capability::CampaignsRead,
            RecordKind::Property => Capability::PropertiesRead,
        }
    }

    /// The capability required to create, edit, or delete records of a kind
    pub fn write_for(kind: RecordKind) -> Capability {
        match kind {
            RecordKind::Lead => Capability::LeadsWrite,
            RecordKind::Task => Capability::TasksWrite,
            RecordKind::Campaign => Capability::CampaignsWrite,
            RecordKind::Property => Capability::PropertiesWrite,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities a role grants, before the plan ceiling is applied
fn role_grants(role: MembershipRole) -> &'static [Capability] {
    use Capability::*;

    const OWNER_ADMIN: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        LeadsExport,
        TasksRead,
        TasksWrite,
        CampaignsRead,
        CampaignsWrite,
        PropertiesRead,
        PropertiesWrite,
        AutomationsManage,
        MembersManage,
        BillingManage,
        ReportsView,
    ];
    const ADMIN: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        LeadsExport,
        TasksRead,
        TasksWrite,
        CampaignsRead,
        CampaignsWrite,
        PropertiesRead,
        PropertiesWrite,
        AutomationsManage,
        MembersManage,
        ReportsView,
    ];
    const MEMBER: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        TasksRead,
        TasksWrite,
        CampaignsRead,
        CampaignsWrite,
        PropertiesRead,
        PropertiesWrite,
        ReportsView,
    ];
    const VIEWER: &[Capability] = &[
        LeadsRead,
        TasksRead,
        CampaignsRead,
        PropertiesRead,
        ReportsView,
    ];

    match role {
        MembershipRole::Owner => OWNER_ADMIN,
        MembershipRole::Admin => ADMIN,
        MembershipRole::Member => MEMBER,
        MembershipRole::Viewer => VIEWER,
    }
}

/// Capabilities a plan tier pays for (the feature ceiling)
fn plan_ceiling(tier: PlanTier) -> &'static [Capability] {
    use Capability::*;

    const STARTER: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        TasksRead,
        TasksWrite,
        MembersManage,
        BillingManage,
        ReportsView,
    ];
    const GROWTH: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        TasksRead,
        TasksWrite,
        CampaignsRead,
        CampaignsWrite,
        AutomationsManage,
        MembersManage,
        BillingManage,
        ReportsView,
    ];
    const PRO: &[Capability] = &[
        LeadsRead,
        LeadsWrite,
        LeadsExport,
        TasksRead,
        TasksWrite,
        CampaignsRead,
        CampaignsWrite,
        PropertiesRead,
        PropertiesWrite,
        AutomationsManage,
        MembersManage,
        BillingManage,
        ReportsView,
    ];

    match tier {
        PlanTier::Starter => STARTER,
        PlanTier::Growth => GROWTH,
        PlanTier::Pro | PlanTier::Enterprise => PRO,
    }
}

/// Resolves the capability set for a (role, plan tier) pair
///
/// Pure and total: the grant is role_grants ∩ plan_ceiling, and a pair with
/// no overlap yields the empty set rather than an error.
pub fn capabilities_for(role: MembershipRole, tier: PlanTier) -> HashSet<Capability> {
    let ceiling: HashSet<Capability> = plan_ceiling(tier).iter().copied().collect();
    role_grants(role)
        .iter()
        .copied()
        .filter(|cap| ceiling.contains(cap))
        .collect()
}
