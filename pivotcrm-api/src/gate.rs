/// Authorization gate for request handlers
///
/// Thin helpers over the permission checker that translate authorization
/// outcomes into API errors. Every protected handler calls one of these
/// before touching tenant data.
///
/// The mapping is deliberate:
/// - Unknown organization, archived organization, or non-member caller:
///   404, identical to a missing resource
/// - Member without the required capability: 403
use crate::error::{ApiError, ApiResult};
use pivotcrm_shared::models::membership::MembershipRole;
use pivotcrm_shared::perm::{Capability, PermissionChecker};
use uuid::Uuid;

/// Requires the caller to hold every listed capability
pub async fn require_all(
    checker: &PermissionChecker,
    org_id: Uuid,
    user_id: Uuid,
    required: &[Capability],
) -> ApiResult<()> {
    if checker.check_all(org_id, user_id, required).await? {
        Ok(())
    } else {
        Err(forbidden(required))
    }
}

/// Requires the caller to hold at least one of the listed capabilities
pub async fn require_any(
    checker: &PermissionChecker,
    org_id: Uuid,
    user_id: Uuid,
    required: &[Capability],
) -> ApiResult<()> {
    if checker.check_any(org_id, user_id, required).await? {
        Ok(())
    } else {
        Err(forbidden(required))
    }
}

/// Requires the caller to be an active member, returning their role
///
/// For endpoints open to every member regardless of capability, like reading
/// the organization itself.
pub async fn require_member(
    checker: &PermissionChecker,
    org_id: Uuid,
    user_id: Uuid,
) -> ApiResult<MembershipRole> {
    let role = checker.user_role(org_id, user_id).await?;
    Ok(role)
}

fn forbidden(required: &[Capability]) -> ApiError {
    let caps: Vec<&str> = required.iter().map(Capability::as_str).collect();
    ApiError::Forbidden(format!("Missing required capability: {}", caps.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_names_capabilities() {
        let err = forbidden(&[Capability::LeadsWrite, Capability::ReportsView]);
        assert!(err
            .to_string()
            .contains("leads.write, reports.view"));
    }
}
