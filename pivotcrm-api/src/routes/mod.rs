/// API route handlers
///
/// Handlers are grouped by resource; the router table lives in `app`.
pub mod executions;
pub mod health;
pub mod members;
pub mod orgs;
pub mod records;
pub mod rules;
