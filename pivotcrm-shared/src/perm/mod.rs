/// Permission core
///
/// The capability table is pure and static; the checker layers database
/// resolution and caching on top of it. Everything here fails closed.
pub mod capability;
pub mod checker;

pub use capability::{capabilities_for, Capability};
pub use checker::{PermError, PermSource, PermissionChecker, PgPermSource};
