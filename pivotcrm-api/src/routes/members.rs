/// Membership management routes
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/members` - list members (any active member)
/// - `POST /v1/orgs/:org_id/members` - invite a user (members.manage)
/// - `POST /v1/orgs/:org_id/members/accept` - accept own invite
/// - `PATCH /v1/orgs/:org_id/members/:user_id` - change a role (members.manage)
/// - `DELETE /v1/orgs/:org_id/members/:user_id` - remove a member (members.manage)
///
/// Role changes on the owner and removal of the owner are rejected; ownership
/// transfer is a separate concern this surface does not cover.
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
use pivotcrm_shared::models::membership::{Membership, MembershipRole};
use pivotcrm_shared::perm::Capability;
use serde::Deserialize;
use uuid::Uuid;

/// Request body for inviting a user
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    /// User to invite
    pub user_id: Uuid,

    /// Role the invite carries
    pub role: MembershipRole,
}

/// Request body for changing a member's role
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role
    pub role: MembershipRole,
}

/// Lists an organization's members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    gate::require_member(&state.permissions, org_id, auth.user_id).await?;

    let members = Membership::list_by_org(&state.db, org_id).await?;
    Ok(Json(members))
}

/// Invites a user into the organization
///
/// Inviting with the owner role is rejected; only organization creation
/// assigns it. Re-inviting a removed member succeeds; an existing active or
/// invited member conflicts.
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::MembersManage],
    )
    .await?;

    if body.role == MembershipRole::Owner {
        return Err(ApiError::BadRequest(
            "Cannot invite a user as owner".to_string(),
        ));
    }

    let membership = Membership::invite(&state.db, org_id, body.user_id, body.role)
        .await?
        .ok_or_else(|| ApiError::Conflict("User is already a member".to_string()))?;

    tracing::info!(org_id = %org_id, user_id = %body.user_id, role = ?body.role, "Member invited");
    Ok((StatusCode::CREATED, Json(membership)))
}

/// Accepts the caller's own pending invite
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Membership>> {
    let membership = Membership::accept_invite(&state.db, org_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No pending invite".to_string()))?;

    state.permissions.invalidate(org_id, auth.user_id);

    tracing::info!(org_id = %org_id, user_id = %auth.user_id, "Invite accepted");
    Ok(Json(membership))
}

/// Changes an active member's role
pub async fn update_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::MembersManage],
    )
    .await?;

    if body.role == MembershipRole::Owner {
        return Err(ApiError::BadRequest(
            "Cannot promote a member to owner".to_string(),
        ));
    }

    let current = Membership::active_role(&state.db, org_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;
    if current == MembershipRole::Owner {
        return Err(ApiError::BadRequest(
            "The owner's role cannot be changed".to_string(),
        ));
    }

    let membership = Membership::update_role(&state.db, org_id, user_id, body.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    state.permissions.invalidate(org_id, user_id);

    tracing::info!(org_id = %org_id, user_id = %user_id, role = ?body.role, "Member role changed");
    Ok(Json(membership))
}

/// Removes a member
///
/// The membership row is kept with removed status so the user can be
/// re-invited later.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::MembersManage],
    )
    .await?;

    let current = Membership::active_role(&state.db, org_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;
    if current == MembershipRole::Owner {
        return Err(ApiError::BadRequest(
            "The owner cannot be removed".to_string(),
        ));
    }

    let removed = Membership::remove(&state.db, org_id, user_id).await?;
    if !removed {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    state.permissions.invalidate(org_id, user_id);

    tracing::info!(org_id = %org_id, user_id = %user_id, "Member removed");
    Ok(StatusCode::NO_CONTENT)
}
