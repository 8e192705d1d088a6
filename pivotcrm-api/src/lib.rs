/// PivotCRM HTTP API
///
/// Axum service exposing organizations, memberships, subscriptions, domain
/// records, automation rules, and the automation audit log. Every tenant
/// route sits behind JWT authentication and a per-request capability gate.
pub mod app;
pub mod config;
pub mod error;
pub mod gate;
pub mod routes;
