//! Authentication and Authorization module
//!
//! Provides JWT token-based authentication and bcrypt password hashing.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use middleware::{admin_middleware, auth_middleware, AuthState, AuthenticatedUser};
pub use password::{hash_password, verify_password};
