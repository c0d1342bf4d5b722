//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{NewUser, User, UserUpdate};

/// User API representation. The `password` field carries the stored bcrypt
/// hash — plaintext never appears in a response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub age: i32,
    pub hobbies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            password: u.password_hash,
            is_admin: u.is_admin,
            age: u.age,
            hobbies: u.hobbies,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Request body for register / create / update. `password` arrives in
/// plaintext and is hashed before it reaches the repository; updates always
/// rehash it, even if the caller resent the stored hash.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    pub age: i32,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

impl UserRequest {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username,
            password_hash,
            is_admin: self.is_admin,
            age: self.age,
            hobbies: self.hobbies,
        }
    }

    pub fn into_update(self, password_hash: String) -> UserUpdate {
        UserUpdate {
            username: self.username,
            password_hash,
            is_admin: self.is_admin,
            age: self.age,
            hobbies: self.hobbies,
        }
    }
}

/// Search / export request body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Filter field: "username" or "hobbies"
    pub field_name: Option<String>,
    /// Substring to match
    pub field_value: Option<String>,
    /// 1-based page number, defaults to 1
    #[validate(range(min = 1, message = "pageNumber must be at least 1"))]
    pub page_number: Option<u32>,
    /// Ascending sort key: "username" or "age"
    pub sort_by: Option<String>,
}
