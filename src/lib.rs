//! # User Management API
//!
//! REST API for managing user accounts: registration, login, admin-only CRUD,
//! search with filtering/sorting/pagination, and CSV export.
//!
//! ## Architecture
//!
//! - **domain**: Core entities, errors and repository traits
//! - **infrastructure**: External concerns (SeaORM entities, migrations, repositories)
//! - **interfaces**: HTTP layer (router, handlers, DTOs, Swagger documentation)
//! - **auth**: JWT authentication and password hashing
//! - **config** / **server**: configuration and process lifecycle

pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::database::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::router::create_router;
