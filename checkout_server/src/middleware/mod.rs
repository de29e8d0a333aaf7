mod acl;
mod jwt_auth;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use jwt_auth::{JwtAuthMiddlewareFactory, JwtAuthMiddlewareService};
