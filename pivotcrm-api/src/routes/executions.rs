/// Automation audit log routes
///
/// # Endpoints
///
/// - `GET /v1/orgs/:org_id/executions` - recent executions (reports.view)
/// - `GET /v1/orgs/:org_id/rules/:rule_id/executions` - one rule's history
use crate::{app::AppState, error::ApiResult, gate};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use pivotcrm_shared::auth::middleware::AuthContext;
use pivotcrm_shared::models::automation_execution::AutomationExecution;
use pivotcrm_shared::perm::Capability;
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum rows to return (default 50, capped at 500)
    pub limit: Option<i64>,
}

impl ListQuery {
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Lists an organization's recent executions, newest first
pub async fn list_executions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AutomationExecution>>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::ReportsView],
    )
    .await?;

    let executions =
        AutomationExecution::list_by_org(&state.db, org_id, query.effective_limit()).await?;
    Ok(Json(executions))
}

/// Lists one rule's executions, newest first
pub async fn list_rule_executions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((org_id, rule_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AutomationExecution>>> {
    gate::require_all(
        &state.permissions,
        org_id,
        auth.user_id,
        &[Capability::ReportsView],
    )
    .await?;

    let executions =
        AutomationExecution::list_by_rule(&state.db, org_id, rule_id, query.effective_limit())
            .await?;
    Ok(Json(executions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamping() {
        assert_eq!(ListQuery { limit: None }.effective_limit(), 50);
        assert_eq!(ListQuery { limit: Some(10) }.effective_limit(), 10);
        assert_eq!(ListQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(ListQuery { limit: Some(10_000) }.effective_limit(), 500);
    }
}
