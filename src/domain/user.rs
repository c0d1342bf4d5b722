//! User domain model and repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::DomainResult;

/// Fixed page size for search results.
pub const SEARCH_PAGE_SIZE: u64 = 10;

/// A user account.
///
/// `password_hash` always holds a bcrypt hash; plaintext passwords exist only
/// transiently inside the handlers that hash them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub age: i32,
    pub hobbies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a user. The id and timestamps are generated by
/// the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub age: i32,
    pub hobbies: Vec<String>,
}

/// Full replacement of a user's mutable fields.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub age: i32,
    pub hobbies: Vec<String>,
}

/// Field a search filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Username,
    Hobbies,
}

impl SearchField {
    /// Parse the request's enum-like field name. Unknown names are a
    /// validation error at the handler level.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "username" => Some(Self::Username),
            "hobbies" => Some(Self::Hobbies),
            _ => None,
        }
    }
}

/// Key for ascending sort of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Username,
    Age,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "username" => Some(Self::Username),
            "age" => Some(Self::Age),
            _ => None,
        }
    }
}

/// A validated search: optional filter (username substring, or hobbies list
/// membership), optional ascending sort, 1-based page over a fixed page size.
///
/// The sort order is attached before the page slice, so pagination always
/// operates on the fully sorted result set.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub filter: Option<(SearchField, String)>,
    pub sort: Option<SortKey>,
    pub page: u32,
}

/// Persistence seam for user accounts.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    /// Insert a new user. A username collision surfaces as
    /// [`DomainError::Conflict`](super::DomainError::Conflict) via the
    /// storage-level unique constraint.
    async fn create(&self, new_user: NewUser) -> DomainResult<User>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    async fn find_all(&self) -> DomainResult<Vec<User>>;

    /// Full-field overwrite. Returns `None` if the user does not exist.
    async fn update(&self, id: &str, update: UserUpdate) -> DomainResult<Option<User>>;

    /// Hard delete. Fails with `NotFound` if the user does not exist.
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Filter/sort/paginate over all users.
    async fn search(&self, query: SearchQuery) -> DomainResult<Vec<User>>;

    /// Users whose username contains `value` or whose hobbies list includes
    /// it as an element (export).
    async fn find_matching(&self, value: &str) -> DomainResult<Vec<User>>;
}
