/// Database models
///
/// Each model wraps its table with static async methods over a `PgPool`.
/// Every tenant-scoped query takes the owning organization id explicitly;
/// tenancy is never inferred.
pub mod automation_execution;
pub mod automation_rule;
pub mod membership;
pub mod organization;
pub mod record;
pub mod subscription;
