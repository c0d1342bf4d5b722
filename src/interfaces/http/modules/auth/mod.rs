//! Auth module — login and anonymous registration

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
