//! HTTP interface: router, middleware, handlers and DTOs

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;
