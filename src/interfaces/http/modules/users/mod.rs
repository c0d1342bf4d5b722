//! Users module — admin-only CRUD, search and export

pub mod dto;
pub mod export;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
