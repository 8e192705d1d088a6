/// Membership model and database operations
///
/// Memberships link users to organizations with a role and a status. They are
/// the first half of permission resolution: the Permission Checker looks up
/// the caller's ACTIVE membership to learn their role, then combines it with
/// the organization's plan tier.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('owner', 'admin', 'member', 'viewer');
/// CREATE TYPE membership_status AS ENUM ('active', 'invited', 'removed');
///
/// CREATE TABLE memberships (
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     user_id UUID NOT NULL,
///     role membership_role NOT NULL DEFAULT 'member',
///     status membership_status NOT NULL DEFAULT 'invited',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (org_id, user_id)
/// );
/// ```
///
/// The composite primary key guarantees at most one membership row per
/// (organization, user), so at most one ACTIVE membership per pair. Removal
/// transitions status to `removed` rather than deleting the row.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role a user holds within an organization
///
/// Independent of the billing plan; the Capability Table combines the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Full control, including billing and archiving the organization
    Owner,

    /// Everything except billing
    Admin,

    /// Day-to-day CRM work on records
    Member,

    /// Read-only access
    Viewer,
}

impl MembershipRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Owner => "owner",
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
            MembershipRole::Viewer => "viewer",
        }
    }
}

/// Lifecycle status of a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Member participates in the organization
    Active,

    /// Invitation issued, not yet accepted
    Invited,

    /// Member was removed; row is kept for audit
    Removed,
}

impl MembershipStatus {
    /// Converts status to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Invited => "invited",
            MembershipStatus::Removed => "removed",
        }
    }
}

/// Membership model representing a user-organization relationship
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Organization ID
    pub org_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MembershipRole,

    /// Lifecycle status
    pub status: MembershipStatus,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a membership directly in ACTIVE status
///
/// Used when an organization is created and the owner joins immediately.
/// All other members go through [`Membership::invite`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Organization ID
    pub org_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign
    pub role: MembershipRole,
}

impl Membership {
    /// Creates a membership in ACTIVE status
    ///
    /// # Errors
    ///
    /// Returns an error if the membership already exists or the organization
    /// is missing.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (org_id, user_id, role, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING org_id, user_id, role, status, created_at, updated_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Invites a user to an organization
    ///
    /// Creates the membership in INVITED status. A previously removed member
    /// can be re-invited; an active or already-invited member cannot.
    pub async fn invite(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (org_id, user_id, role, status)
            VALUES ($1, $2, $3, 'invited')
            ON CONFLICT (org_id, user_id) DO UPDATE
            SET role = EXCLUDED.role, status = 'invited', updated_at = NOW()
            WHERE memberships.status = 'removed'
            RETURNING org_id, user_id, role, status, created_at, updated_at
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Accepts a pending invitation, transitioning INVITED to ACTIVE
    ///
    /// # Returns
    ///
    /// The activated membership, or None if no invitation is pending
    pub async fn accept_invite(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = 'active', updated_at = NOW()
            WHERE org_id = $1 AND user_id = $2 AND status = 'invited'
            RETURNING org_id, user_id, role, status, created_at, updated_at
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the ACTIVE membership for a user in an organization
    ///
    /// Invited and removed memberships are not visible here: permission
    /// resolution only ever considers ACTIVE memberships.
    pub async fn find_active(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT org_id, user_id, role, status, created_at, updated_at
            FROM memberships
            WHERE org_id = $1 AND user_id = $2 AND status = 'active'
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Gets the user's role if they have an ACTIVE membership
    pub async fn active_role(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRole>, sqlx::Error> {
        let role: Option<MembershipRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE org_id = $1 AND user_id = $2 AND status = 'active'
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Changes a member's role
    ///
    /// Only ACTIVE memberships can have their role changed.
    pub async fn update_role(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
        role: MembershipRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3, updated_at = NOW()
            WHERE org_id = $1 AND user_id = $2 AND status = 'active'
            RETURNING org_id, user_id, role, status, created_at, updated_at
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Removes a member, transitioning status to REMOVED
    ///
    /// The row is retained for audit. Returns true if an active or invited
    /// membership was removed.
    pub async fn remove(pool: &PgPool, org_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memberships
            SET status = 'removed', updated_at = NOW()
            WHERE org_id = $1 AND user_id = $2 AND status IN ('active', 'invited')
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists memberships of an organization, oldest first
    ///
    /// Includes invited and removed rows; callers filter by status as needed.
    pub async fn list_by_org(pool: &PgPool, org_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT org_id, user_id, role, status, created_at, updated_at
            FROM memberships
            WHERE org_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(MembershipRole::Owner.as_str(), "owner");
        assert_eq!(MembershipRole::Admin.as_str(), "admin");
        assert_eq!(MembershipRole::Member.as_str(), "member");
        assert_eq!(MembershipRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(MembershipStatus::Active.as_str(), "active");
        assert_eq!(MembershipStatus::Invited.as_str(), "invited");
        assert_eq!(MembershipStatus::Removed.as_str(), "removed");
    }

    #[test]
    fn test_role_serde_roundtrip() {
        let json = serde_json::to_string(&MembershipRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: MembershipRole = serde_json::from_str(&json).unwrap();
        assert_eq!(role, MembershipRole::Admin);
    }

    // Database operations are covered by route-level tests against a live
    // database; the status transition rules live entirely in the SQL above.
}
