/// Organization model and database operations
///
/// Organizations are the tenant boundary in PivotCRM. Every record, rule,
/// membership, and subscription belongs to exactly one organization, and every
/// query in the core is parameterized by the owning organization id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     owner_user_id UUID NOT NULL,
///     archived_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Organizations are never hard-deleted. Archiving sets `archived_at` and
/// leaves all tenant data in place for audit purposes.
///
/// # Example
///
/// ```no_run
/// use pivotcrm_shared::models::organization::{Organization, CreateOrganization};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let org = Organization::create(&pool, CreateOrganization {
///     name: "Harbor Realty".to_string(),
///     owner_user_id: owner,
/// }).await?;
/// println!("Created organization {}", org.id);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organization model representing one tenant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// User who owns the organization
    ///
    /// Invariant: exactly one owner per organization. Ownership transfer
    /// updates this column together with the membership roles.
    pub owner_user_id: Uuid,

    /// Set when the organization is soft-archived
    pub archived_at: Option<DateTime<Utc>>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Display name
    pub name: String,

    /// Owning user
    pub owner_user_id: Uuid,
}

impl Organization {
    /// Whether the organization has been archived
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Creates a new organization
    ///
    /// The caller is responsible for creating the owner's ACTIVE membership in
    /// the same request (see the org creation route).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, owner_user_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_user_id, archived_at, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(data.owner_user_id)
        .fetch_one(pool)
        .await?;

        Ok(org)
    }

    /// Finds an organization by ID
    ///
    /// Returns archived organizations as well; callers that must exclude them
    /// check `is_archived`.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, owner_user_id, archived_at, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Soft-archives an organization
    ///
    /// Idempotent: archiving an already-archived organization keeps the
    /// original `archived_at`.
    ///
    /// # Returns
    ///
    /// True if the organization existed, false otherwise
    pub async fn archive(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET archived_at = COALESCE(archived_at, NOW()), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Renames an organization
    pub async fn rename(pool: &PgPool, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, owner_user_id, archived_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(archived: bool) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Harbor Realty".to_string(),
            owner_user_id: Uuid::new_v4(),
            archived_at: archived.then(Utc::now),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_archived() {
        assert!(!sample(false).is_archived());
        assert!(sample(true).is_archived());
    }
}
