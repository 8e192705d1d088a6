/// Domain record routes
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/records?kind=lead` - list by kind
/// - `POST /v1/orgs/:org_id/records` - create
/// - `GET /v1/orgs/:org_id/records/:record_id` - read
/// - `PATCH /v1/orgs/:org_id/records/:record_id` - replace payload
/// - `PUT /v1/orgs/:org_id/records/:record_id/status` - change status
/// - `DELETE /v1/orgs/:org_id/records/:record_id` - delete
///
/// Each vertical is gated by its own read/write capability, so a starter-plan
/// member can work leads while campaign routes return 403. Mutations dispatch
/// the matching domain event after the write commits; event delivery never
/// affects the response.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    gate,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use pivotcrm_shared::auth::middleware::AuthContext;
use pivotcrm_shared::automation::{DomainEvent, Trigger};
use pivotcrm_shared::models::record::{CreateRecord, DomainRecord, RecordKind};
use pivotcrm_shared::perm::Capability;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// Request body for creating a record
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    /// Vertical the record belongs to
    pub kind: RecordKind,

    /// Initial lifecycle status
    pub status: String,

    /// Vertical-specific fields
    #[serde(default)]
    pub payload: JsonValue,
}

/// Request body for replacing a record's payload
#[derive(Debug, Deserialize)]
pub struct UpdatePayloadRequest {
    /// New payload
    pub payload: JsonValue,
}

/// Request body for changing a record's status
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// New lifecycle status
    pub status: String,
}

/// Query parameters for listing records
#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    /// Vertical to list
    pub kind: RecordKind,

    /// Maximum rows to return (default 50, capped at 500)
    pub limit: Option<i64>,
}

/// Builds the event context for a record mutation
///
/// System fields are set before the payload is merged, so a payload key named
/// `record_id` or `status` cannot shadow them.
fn record_event(trigger: Trigger, record: &DomainRecord) -> DomainEvent {
    DomainEvent::new(trigger, record.org_id)
        .with("record_id", json!(record.id))
        .with("kind", json!(record.kind.as_str()))
        .with("status", json!(record.status))
        .merge_payload(&record.payload)
}

/// The trigger fired when a record of this kind moves to the given status
///
/// Writing the status a record already holds is a no-op and fires nothing.
fn status_trigger(kind: RecordKind, previous: &str, status: &str) -> Option<Trigger> {
    if previous == status {
        return None;
    }
    match (kind, status) {
        (RecordKind::Lead, _) => Some(Trigger::LeadStageChanged),
        (RecordKind::Task, "completed") => Some(Trigger::TaskCompleted),
        (RecordKind::Campaign, "launched") => Some(Trigger::CampaignLaunched),
        (RecordKind::Property, "listed") => Some(Trigger::PropertyListed),
        _ => None,
    }
}

/// Lists records of one kind, newest first
pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListRecordsQuery>,
) -> ApiResult<Json<Vec<DomainRecord>>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::read_for(query.kind)],
    )
    .await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let records = DomainRecord::list_by_kind(&state.db, org_id, query.kind, limit).await?;
    Ok(Json(records))
}

/// Creates a record
///
/// Creating a lead fires `lead.created`; the other verticals fire their
/// trigger on status transitions, not on creation.
pub async fn create_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateRecordRequest>,
) -> ApiResult<(StatusCode, Json<DomainRecord>)> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::write_for(body.kind)],
    )
    .await?;

    let record = DomainRecord::create(
        &state.db,
        CreateRecord {
            org_id,
            kind: body.kind,
            status: body.status,
            payload: body.payload,
        },
    )
    .await?;

    if record.kind == RecordKind::Lead {
        state
            .dispatcher
            .dispatch(record_event(Trigger::LeadCreated, &record));
    }

    tracing::info!(org_id = %org_id, record_id = %record.id, kind = %record.kind.as_str(), "Record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Reads a record
pub async fn get_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<DomainRecord>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let record = DomainRecord::find_scoped(&state.db, org_id, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    // The read gate depends on the record's kind, so it runs after the fetch.
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::read_for(record.kind)],
    )
    .await?;

    Ok(Json(record))
}

/// Replaces a record's payload
///
/// Lead payload changes fire `lead.updated`.
pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdatePayloadRequest>,
) -> ApiResult<Json<DomainRecord>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let existing = DomainRecord::find_scoped(&state.db, org_id, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::write_for(existing.kind)],
    )
    .await?;

    let record = DomainRecord::update_payload(&state.db, org_id, record_id, &body.payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    if record.kind == RecordKind::Lead {
        state
            .dispatcher
            .dispatch(record_event(Trigger::LeadUpdated, &record));
    }

    Ok(Json(record))
}

/// Changes a record's status
///
/// Status transitions drive most of the trigger catalog: any lead move fires
/// `lead.stage_changed`, a task reaching "completed" fires `task.completed`,
/// a campaign reaching "launched" fires `campaign.launched`, and a property
/// reaching "listed" fires `property.listed`.
pub async fn set_record_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetStatusRequest>,
) -> ApiResult<Json<DomainRecord>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let existing = DomainRecord::find_scoped(&state.db, org_id, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::write_for(existing.kind)],
    )
    .await?;

    let previous_status = existing.status;
    let record = DomainRecord::update_status(&state.db, org_id, record_id, &body.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    if let Some(trigger) = status_trigger(record.kind, &previous_status, &record.status) {
        state.dispatcher.dispatch(
            record_event(trigger, &record).with("previous_status", json!(previous_status)),
        );
    }

    tracing::info!(org_id = %org_id, record_id = %record_id, status = %record.status, "Record status changed");
    Ok(Json(record))
}

/// Deletes a record
///
/// Fires `record.deleted` with the deleted record's last known fields.
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let existing = DomainRecord::find_scoped(&state.db, org_id, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::write_for(existing.kind)],
    )
    .await?;

    let record = DomainRecord::delete_scoped(&state.db, org_id, record_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Record not found".to_string()))?;

    state
        .dispatcher
        .dispatch(record_event(Trigger::RecordDeleted, &record));

    tracing::info!(org_id = %org_id, record_id = %record_id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(kind: RecordKind, status: &str, payload: JsonValue) -> DomainRecord {
        DomainRecord {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            kind,
            status: status.to_string(),
            payload,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_trigger_mapping() {
        assert_eq!(
            status_trigger(RecordKind::Lead, "new", "qualified"),
            Some(Trigger::LeadStageChanged)
        );
        assert_eq!(
            status_trigger(RecordKind::Task, "open", "completed"),
            Some(Trigger::TaskCompleted)
        );
        assert_eq!(status_trigger(RecordKind::Task, "completed", "open"), None);
        assert_eq!(
            status_trigger(RecordKind::Campaign, "draft", "launched"),
            Some(Trigger::CampaignLaunched)
        );
        assert_eq!(
            status_trigger(RecordKind::Property, "draft", "listed"),
            Some(Trigger::PropertyListed)
        );
        assert_eq!(status_trigger(RecordKind::Property, "listed", "sold"), None);
    }

    #[test]
    fn test_unchanged_status_fires_nothing() {
        assert_eq!(status_trigger(RecordKind::Lead, "qualified", "qualified"), None);
        assert_eq!(status_trigger(RecordKind::Task, "completed", "completed"), None);
        assert_eq!(status_trigger(RecordKind::Campaign, "launched", "launched"), None);
    }

    #[test]
    fn test_event_system_fields_win_over_payload() {
        let rec = record(
            RecordKind::Lead,
            "new",
            json!({"status": "shadowed", "source": "webinar"}),
        );
        let event = record_event(Trigger::LeadCreated, &rec);

        assert_eq!(event.context["status"], json!("new"));
        assert_eq!(event.context["source"], json!("webinar"));
        assert_eq!(event.context["record_id"], json!(rec.id));
        assert_eq!(event.context["kind"], json!("lead"));
    }
}
