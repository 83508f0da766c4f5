pub mod auth;
pub mod response;
pub mod workspace;

pub use auth::authenticate;
pub use response::{ApiResponse, ApiResult};
pub use workspace::require_membership;
