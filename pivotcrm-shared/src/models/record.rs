/// Domain record model for the CRM verticals
///
/// Leads, tasks, campaigns, and property listings share one multi-tenant
/// table. The permission and automation core treats them as opaque payloads:
/// it only branches on the owning organization, the kind, and the status
/// column. Vertical-specific fields live in the JSONB payload and are exposed
/// to rule conditions through the event context.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE record_kind AS ENUM ('lead', 'task', 'campaign', 'property');
///
/// CREATE TABLE domain_records (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     kind record_kind NOT NULL,
///     status VARCHAR(100) NOT NULL,
///     payload JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_records_org_kind ON domain_records (org_id, kind, created_at DESC);
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// The CRM verticals a record can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "record_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A sales lead
    Lead,

    /// A follow-up task
    Task,

    /// A marketing campaign
    Campaign,

    /// A property listing
    Property,
}

impl RecordKind {
    /// Converts kind to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Lead => "lead",
            RecordKind::Task => "task",
            RecordKind::Campaign => "campaign",
            RecordKind::Property => "property",
        }
    }
}

/// A tenant-scoped domain record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DomainRecord {
    /// Unique record ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub org_id: Uuid,

    /// Vertical this record belongs to
    pub kind: RecordKind,

    /// Lifecycle status, vertical-specific (e.g. "new", "qualified", "open")
    pub status: String,

    /// Vertical-specific fields (JSONB)
    pub payload: JsonValue,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a domain record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecord {
    /// Owning organization
    pub org_id: Uuid,

    /// Vertical
    pub kind: RecordKind,

    /// Initial status
    pub status: String,

    /// Vertical-specific fields
    pub payload: JsonValue,
}

impl DomainRecord {
    /// Creates a record
    pub async fn create(pool: &PgPool, data: CreateRecord) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, DomainRecord>(
            r#"
            INSERT INTO domain_records (org_id, kind, status, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, org_id, kind, status, payload, created_at, updated_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.kind)
        .bind(&data.status)
        .bind(&data.payload)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Finds a record within the caller's organization
    ///
    /// Foreign and missing ids both return None.
    pub async fn find_scoped(
        pool: &PgPool,
        org_id: Uuid,
        record_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, DomainRecord>(
            r#"
            SELECT id, org_id, kind, status, payload, created_at, updated_at
            FROM domain_records
            WHERE id = $1 AND org_id = $2
            "#,
        )
        .bind(record_id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Lists records of one kind for an organization, newest first
    pub async fn list_by_kind(
        pool: &PgPool,
        org_id: Uuid,
        kind: RecordKind,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let records = sqlx::query_as::<_, DomainRecord>(
            r#"
            SELECT id, org_id, kind, status, payload, created_at, updated_at
            FROM domain_records
            WHERE org_id = $1 AND kind = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(org_id)
        .bind(kind)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Updates a record's status within the caller's organization
    pub async fn update_status(
        pool: &PgPool,
        org_id: Uuid,
        record_id: Uuid,
        status: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, DomainRecord>(
            r#"
            UPDATE domain_records
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, kind, status, payload, created_at, updated_at
            "#,
        )
        .bind(record_id)
        .bind(org_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Replaces a record's payload within the caller's organization
    pub async fn update_payload(
        pool: &PgPool,
        org_id: Uuid,
        record_id: Uuid,
        payload: &JsonValue,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, DomainRecord>(
            r#"
            UPDATE domain_records
            SET payload = $3, updated_at = NOW()
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, kind, status, payload, created_at, updated_at
            "#,
        )
        .bind(record_id)
        .bind(org_id)
        .bind(payload)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Deletes a record within the caller's organization
    ///
    /// Returns the deleted record so the caller can build the deletion event.
    pub async fn delete_scoped(
        pool: &PgPool,
        org_id: Uuid,
        record_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, DomainRecord>(
            r#"
            DELETE FROM domain_records
            WHERE id = $1 AND org_id = $2
            RETURNING id, org_id, kind, status, payload, created_at, updated_at
            "#,
        )
        .bind(record_id)
        .bind(org_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(RecordKind::Lead.as_str(), "lead");
        assert_eq!(RecordKind::Task.as_str(), "task");
        assert_eq!(RecordKind::Campaign.as_str(), "campaign");
        assert_eq!(RecordKind::Property.as_str(), "property");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&RecordKind::Property).unwrap();
        assert_eq!(json, "\"property\"");
        let kind: RecordKind = serde_json::from_str("\"lead\"").unwrap();
        assert_eq!(kind, RecordKind::Lead);
    }
}
