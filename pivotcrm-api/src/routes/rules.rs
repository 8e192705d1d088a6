/// Automation rule routes
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/rules` - list (automations.manage or reports.view)
/// - `POST /v1/orgs/:org_id/rules` - create (automations.manage)
/// - `GET /v1/orgs/:org_id/rules/:rule_id` - read
/// - `PATCH /v1/orgs/:org_id/rules/:rule_id` - update definition
/// - `PUT /v1/orgs/:org_id/rules/:rule_id/status` - pause or resume
/// - `DELETE /v1/orgs/:org_id/rules/:rule_id` - delete
///
/// Definitions are validated on write: the trigger must be in the catalog and
/// every action spec well-formed. Invalid definitions never reach storage, so
/// the engine can assume stored rules parse.
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
use pivotcrm_shared::automation::{ActionSpec, Predicate};
use pivotcrm_shared::models::automation_rule::{
    AutomationRule, CreateRule, RuleStatus, UpdateRule,
};
use pivotcrm_shared::perm::Capability;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a rule
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRuleRequest {
    /// Rule name
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    /// Trigger name
    pub trigger: String,

    /// Condition predicate tree; defaults to always-match
    pub condition: Option<Predicate>,

    /// Ordered action list
    pub actions: Vec<ActionSpec>,
}

/// Request body for updating a rule's definition
#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    /// New name
    pub name: Option<String>,

    /// New trigger
    pub trigger: Option<String>,

    /// New condition
    pub condition: Option<Predicate>,

    /// New action list
    pub actions: Option<Vec<ActionSpec>>,
}

/// Request body for pausing or resuming a rule
#[derive(Debug, Deserialize)]
pub struct SetRuleStatusRequest {
    /// New status
    pub status: RuleStatus,
}

/// Lists an organization's rules
pub async fn list_rules(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AutomationRule>>> {
    gate::require_any(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage, Capability::ReportsView],
    )
    .await?;

    let rules = AutomationRule::list_by_org(&state.db, org_id).await?;
    Ok(Json(rules))
}

/// Creates a rule
pub async fn create_rule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Json(body): Json<CreateRuleRequest>,
) -> ApiResult<(StatusCode, Json<AutomationRule>)> {
    body.validate()?;
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage],
    )
    .await?;

    let rule = AutomationRule::create(
        &state.db,
        CreateRule {
            org_id,
            name: body.name,
            trigger: body.trigger,
            condition: body.condition.unwrap_or_else(Predicate::always),
            actions: body.actions,
        },
    )
    .await?;

    tracing::info!(org_id = %org_id, rule_id = %rule.id, trigger = %rule.trigger, "Rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Reads a rule
pub async fn get_rule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, rule_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<AutomationRule>> {
    gate::require_any(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage, Capability::ReportsView],
    )
    .await?;

    let rule = AutomationRule::find_scoped(&state.db, org_id, rule_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Rule not found".to_string()))?;

    Ok(Json(rule))
}

/// Updates a rule's definition
pub async fn update_rule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateRuleRequest>,
) -> ApiResult<Json<AutomationRule>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage],
    )
    .await?;

    let rule = AutomationRule::update(
        &state.db,
        org_id,
        rule_id,
        UpdateRule {
            name: body.name,
            trigger: body.trigger,
            condition: body.condition,
            actions: body.actions,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Rule not found".to_string()))?;

    tracing::info!(org_id = %org_id, rule_id = %rule_id, "Rule updated");
    Ok(Json(rule))
}

/// Pauses or resumes a rule
pub async fn set_rule_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, rule_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetRuleStatusRequest>,
) -> ApiResult<Json<AutomationRule>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage],
    )
    .await?;

    let rule = AutomationRule::set_status(&state.db, org_id, rule_id, body.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Rule not found".to_string()))?;

    tracing::info!(org_id = %org_id, rule_id = %rule_id, status = ?body.status, "Rule status changed");
    Ok(Json(rule))
}

/// Deletes a rule
///
/// The rule's execution history is kept.
pub async fn delete_rule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, rule_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::AutomationsManage],
    )
    .await?;

    let deleted = AutomationRule::delete_scoped(&state.db, org_id, rule_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Rule not found".to_string()));
    }

    tracing::info!(org_id = %org_id, rule_id = %rule_id, "Rule deleted");
    Ok(StatusCode::NO_CONTENT)
}
