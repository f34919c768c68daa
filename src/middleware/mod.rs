pub mod auth;
pub mod response;
pub mod session;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{found, ApiResponse, ApiResult};
pub use session::session_auth_middleware;
