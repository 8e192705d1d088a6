/// Subscription model and database operations
///
/// Subscriptions carry the billing plan tier for an organization. The plan is
/// the second half of permission resolution: capabilities are granted per
/// (role, plan tier) pair, and the plan acts as the feature ceiling.
///
/// An organization without a subscription row resolves to the lowest tier.
/// This is deliberate fail-closed behavior: a missing or broken billing record
/// can only reduce access, never widen it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE plan_tier AS ENUM ('starter', 'growth', 'pro', 'enterprise');
/// CREATE TYPE subscription_status AS ENUM ('trialing', 'active', 'past_due', 'canceled');
///
/// CREATE TABLE subscriptions (
///     org_id UUID PRIMARY KEY REFERENCES organizations(id),
///     plan plan_tier NOT NULL DEFAULT 'starter',
///     status subscription_status NOT NULL DEFAULT 'trialing',
///     current_period_start TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     current_period_end TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Billing plan tiers, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier: leads and tasks only
    Starter,

    /// Adds campaigns and the automation engine
    Growth,

    /// Adds property listings and data export
    Pro,

    /// Everything, custom contracts
    Enterprise,
}

impl PlanTier {
    /// Converts tier to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Starter => "starter",
            PlanTier::Growth => "growth",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }

    /// Parses a tier from its string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(PlanTier::Starter),
            "growth" => Some(PlanTier::Growth),
            "pro" => Some(PlanTier::Pro),
            "enterprise" => Some(PlanTier::Enterprise),
            _ => None,
        }
    }
}

/// Subscription lifecycle status
///
/// Driven by billing webhooks. `Canceled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In trial period
    Trialing,

    /// Paid and current
    Active,

    /// Payment failed; access retained pending retry
    PastDue,

    /// Terminated; plan benefits revoked
    Canceled,
}

impl SubscriptionStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

/// Subscription model, one row per organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    /// Owning organization
    pub org_id: Uuid,

    /// Purchased plan tier
    pub plan: PlanTier,

    /// Lifecycle status
    pub status: SubscriptionStatus,

    /// Start of the current billing period
    pub current_period_start: DateTime<Utc>,

    /// End of the current billing period (None while trialing without a term)
    pub current_period_end: Option<DateTime<Utc>>,

    /// When the subscription was created
    pub created_at: DateTime<Utc>,

    /// When the subscription was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating a subscription from a billing event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertSubscription {
    /// Owning organization
    pub org_id: Uuid,

    /// New plan tier
    pub plan: PlanTier,

    /// New status
    pub status: SubscriptionStatus,

    /// New billing period end, if known
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Subscription {
    /// The plan tier this subscription actually grants
    ///
    /// A canceled subscription grants the lowest tier regardless of the plan
    /// column; trialing, active, and past-due subscriptions grant their plan.
    pub fn effective_plan(&self) -> PlanTier {
        match self.status {
            SubscriptionStatus::Canceled => PlanTier::Starter,
            _ => self.plan,
        }
    }

    /// Finds the subscription for an organization
    pub async fn find_by_org(pool: &PgPool, org_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT org_id, plan, status, current_period_start, current_period_end,
                   created_at, updated_at
            FROM subscriptions
            WHERE org_id = $1
            "#,
        )
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(sub)
    }

    /// Creates or replaces the subscription for an organization
    ///
    /// Billing webhooks are the only writer; the upsert keeps one row per
    /// organization and resets the period start on every change.
    pub async fn upsert(pool: &PgPool, data: UpsertSubscription) -> Result<Self, sqlx::Error> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (org_id, plan, status, current_period_start, current_period_end)
            VALUES ($1, $2, $3, NOW(), $4)
            ON CONFLICT (org_id) DO UPDATE
            SET plan = EXCLUDED.plan,
                status = EXCLUDED.status,
                current_period_start = NOW(),
                current_period_end = EXCLUDED.current_period_end,
                updated_at = NOW()
            RETURNING org_id, plan, status, current_period_start, current_period_end,
                      created_at, updated_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.plan)
        .bind(data.status)
        .bind(data.current_period_end)
        .fetch_one(pool)
        .await?;

        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(plan: PlanTier, status: SubscriptionStatus) -> Subscription {
        Subscription {
            org_id: Uuid::new_v4(),
            plan,
            status,
            current_period_start: Utc::now(),
            current_period_end: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_ordering() {
        assert!(PlanTier::Starter < PlanTier::Growth);
        assert!(PlanTier::Growth < PlanTier::Pro);
        assert!(PlanTier::Pro < PlanTier::Enterprise);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(PlanTier::parse("pro"), Some(PlanTier::Pro));
        assert_eq!(PlanTier::parse("starter"), Some(PlanTier::Starter));
        assert_eq!(PlanTier::parse("platinum"), None);
    }

    #[test]
    fn test_effective_plan_active() {
        let sub = sample(PlanTier::Pro, SubscriptionStatus::Active);
        assert_eq!(sub.effective_plan(), PlanTier::Pro);
    }

    #[test]
    fn test_effective_plan_past_due_retains_access() {
        let sub = sample(PlanTier::Growth, SubscriptionStatus::PastDue);
        assert_eq!(sub.effective_plan(), PlanTier::Growth);
    }

    #[test]
    fn test_effective_plan_canceled_falls_to_starter() {
        let sub = sample(PlanTier::Enterprise, SubscriptionStatus::Canceled);
        assert_eq!(sub.effective_plan(), PlanTier::Starter);
    }
}
