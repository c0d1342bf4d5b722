//! External concerns: database access

pub mod database;
