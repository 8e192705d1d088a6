/// Organization and subscription routes
///
/// # Endpoints
///
/// - `POST /v1/orgs` - create an organization; the caller becomes its owner
/// - `GET /v1/orgs/:org_id` - read the organization (any active member)
/// - `PATCH /v1/orgs/:org_id` - rename (billing.manage)
/// - `POST /v1/orgs/:org_id/archive` - archive, idempotent (billing.manage)
/// - `GET /v1/orgs/:org_id/permissions` - the caller's capability set
/// - `GET /v1/orgs/:org_id/subscription` - read the plan (any active member)
/// - `PUT /v1/orgs/:org_id/subscription` - change the plan (billing.manage)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    gate,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use pivotcrm_shared::auth::middleware::AuthContext;
use pivotcrm_shared::models::membership::{CreateMembership, Membership, MembershipRole};
use pivotcrm_shared::models::organization::{CreateOrganization, Organization};
use pivotcrm_shared::models::subscription::{
    PlanTier, Subscription, SubscriptionStatus, UpsertSubscription,
};
use pivotcrm_shared::perm::Capability;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request body for creating an organization
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrgRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
}

/// Request body for renaming an organization
#[derive(Debug, Deserialize, Validate)]
pub struct RenameOrgRequest {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
}

/// Request body for changing the subscription
#[derive(Debug, Deserialize)]
pub struct PutSubscriptionRequest {
    /// New plan tier
    pub plan: PlanTier,

    /// New status
    pub status: SubscriptionStatus,

    /// New billing period end
    pub current_period_end: Option<chrono::DateTime<chrono::Utc>>,
}

/// The caller's resolved authorization view of an organization
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    /// The caller's membership role
    pub role: MembershipRole,

    /// The organization's effective plan
    pub plan: PlanTier,

    /// Sorted capability tags the caller holds
    pub capabilities: Vec<String>,
}

/// Creates an organization
///
/// The creator becomes the owner with an active membership; the subscription
/// starts as a starter trial.
pub async fn create_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateOrgRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    body.validate()?;

    let org = Organization::create(
        &state.db,
        CreateOrganization {
            name: body.name,
            owner_user_id: auth.user_id,
        },
    )
    .await?;

    Membership::create(
        &state.db,
        CreateMembership {
            org_id: org.id,
            user_id: auth.user_id,
            role: MembershipRole::Owner,
        },
    )
    .await?;

    Subscription::upsert(
        &state.db,
        UpsertSubscription {
            org_id: org.id,
            plan: PlanTier::Starter,
            status: SubscriptionStatus::Trialing,
            current_period_end: None,
        },
    )
    .await?;

    tracing::info!(org_id = %org.id, owner = %auth.user_id, "Organization created");
    Ok((StatusCode::CREATED, Json(org)))
}

/// Reads an organization
pub async fn get_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Organization>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let org = Organization::find_by_id(&state.db, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(org))
}

/// Renames an organization
pub async fn rename_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<RenameOrgRequest>,
) -> ApiResult<Json<Organization>> {
    body.validate()?;
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::BillingManage],
    )
    .await?;

    let org = Organization::rename(&state.db, org_id, &body.name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

    Ok(Json(org))
}

/// Archives an organization
///
/// Idempotent: archiving an already-archived organization succeeds without
/// changing the original archive timestamp.
pub async fn archive_org(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::BillingManage],
    )
    .await?;

    let archived = Organization::archive(&state.db, org_id).await?;
    if !archived {
        return Err(ApiError::NotFound("Organization not found".to_string()));
    }

    // Every member's cached grant dies with the organization.
    state.permissions.invalidate_org(org_id);

    tracing::info!(org_id = %org_id, "Organization archived");
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the caller's capability set in this organization
pub async fn my_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<PermissionsResponse>> {
    let role = state.permissions.user_role(org_id, auth.user_id).await?;
    let plan = state.permissions.org_plan(org_id, auth.user_id).await?;
    let caps = state
        .permissions
        .user_permissions(org_id, auth.user_id)
        .await?;

    let mut capabilities: Vec<String> = caps.iter().map(|c| c.as_str().to_string()).collect();
    capabilities.sort();

    Ok(Json(PermissionsResponse {
        role,
        plan,
        capabilities,
    }))
}

/// Reads the organization's subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Subscription>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let sub = Subscription::find_by_org(&state.db, org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".to_string()))?;

    Ok(Json(sub))
}

/// Creates or replaces the organization's subscription
pub async fn put_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<PutSubscriptionRequest>,
) -> ApiResult<Json<Subscription>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::BillingManage],
    )
    .await?;

    let sub = Subscription::upsert(
        &state.db,
        UpsertSubscription {
            org_id,
            plan: body.plan,
            status: body.status,
            current_period_end: body.current_period_end,
        },
    )
    .await?;

    // A plan change affects every member's capability set.
    state.permissions.invalidate_org(org_id);

    tracing::info!(org_id = %org_id, plan = ?sub.plan, "Subscription updated");
    Ok(Json(sub))
}
