/// Middleware module
///
/// Request guard for protected routes.

mod jwt_middleware;

pub use jwt_middleware::{authorize, bearer_token, JwtMiddleware};
