//! API modules, one per resource group

pub mod auth;
pub mod health;
pub mod users;
