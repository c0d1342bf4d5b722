//! Core business entities, errors and repository traits

pub mod error;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use user::{
    NewUser, SearchField, SearchQuery, SortKey, User, UserRepositoryInterface, UserUpdate,
    SEARCH_PAGE_SIZE,
};
