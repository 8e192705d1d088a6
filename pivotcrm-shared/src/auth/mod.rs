/// Authentication
///
/// Bearer-token authentication only. Tokens carry identity, never
/// capabilities; authorization is resolved per request by the permission
/// checker.
pub mod jwt;
pub mod middleware;

pub use jwt::{create_token, validate_token, Claims, JwtError};
pub use middleware::{create_jwt_middleware, AuthContext, AuthError};
