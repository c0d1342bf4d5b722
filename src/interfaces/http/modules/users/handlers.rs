//! User management API handlers
//!
//! Admin-only CRUD, search and export endpoints. Authorization is enforced
//! by `auth_middleware` + `admin_middleware` at the router, not here.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::dto::{SearchRequest, UserDto, UserRequest};
use super::export;
use crate::auth::password::hash_password;
use crate::domain::{SearchField, SearchQuery, SortKey, User, UserRepositoryInterface};
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiError, ErrorEnvelope, ValidatedJson};

/// User handler state — concrete over `UserRepository` for Axum compatibility.
#[derive(Clone)]
pub struct UserHandlerState {
    pub repo: Arc<UserRepository>,
}

/// Hash the request password and insert the record. Shared between the
/// anonymous register endpoint and the admin create endpoint.
pub(crate) async fn insert_user(
    repo: &UserRepository,
    request: UserRequest,
) -> Result<User, ApiError> {
    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!("failed to hash password: {}", e);
        ApiError::internal()
    })?;

    let user = repo.create(request.into_new_user(password_hash)).await?;
    Ok(user)
}

/// 201 response with a Location reference to the by-id fetch endpoint.
pub(crate) fn created_response(user: User) -> impl IntoResponse {
    let dto = UserDto::from(user);
    let location = format!("/users/{}", dto.id);
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(dto),
    )
}

#[utoipa::path(
    get,
    path = "/users/all",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 401, description = "Unauthorized", body = ErrorEnvelope),
        (status = 403, description = "Forbidden", body = ErrorEnvelope)
    )
)]
pub async fn get_all_users(
    State(state): State<UserHandlerState>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.repo.find_all().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserDto),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn get_user_by_id(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    match state.repo.find_by_id(&id).await? {
        Some(user) => Ok(Json(UserDto::from(user))),
        None => Err(ApiError::not_found("User not found")),
    }
}

#[utoipa::path(
    post,
    path = "/users/create",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid body or duplicate username", body = ErrorEnvelope)
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = insert_user(&state.repo, request).await?;
    Ok(created_response(user))
}

#[utoipa::path(
    put,
    path = "/users/update/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 400, description = "Invalid body or duplicate username", body = ErrorEnvelope),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    // Always rehash, even if the caller resent the stored hash
    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!("failed to hash password: {}", e);
        ApiError::internal()
    })?;

    match state.repo.update(&id, request.into_update(password_hash)).await? {
        Some(user) => Ok(Json(UserDto::from(user))),
        None => Err(ApiError::not_found("User not found")),
    }
}

#[utoipa::path(
    delete,
    path = "/users/delete/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = ErrorEnvelope)
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.repo.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/search",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching page of users", body = [UserDto]),
        (status = 400, description = "Invalid field or sort key", body = ErrorEnvelope)
    )
)]
pub async fn search_users(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let query = build_search_query(request)?;
    let users = state.repo.search(query).await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Translate the enum-like request strings into a validated query.
fn build_search_query(request: SearchRequest) -> Result<SearchQuery, ApiError> {
    let filter = match (request.field_name, request.field_value) {
        (Some(name), Some(value)) if !name.is_empty() && !value.is_empty() => {
            let field = SearchField::parse(&name)
                .ok_or_else(|| ApiError::bad_request("Invalid field name"))?;
            Some((field, value))
        }
        _ => None,
    };

    let sort = match request.sort_by {
        Some(key) if !key.is_empty() => Some(
            SortKey::parse(&key).ok_or_else(|| ApiError::bad_request("Invalid sort by field"))?,
        ),
        _ => None,
    };

    Ok(SearchQuery {
        filter,
        sort,
        page: request.page_number.unwrap_or(1),
    })
}

#[utoipa::path(
    post,
    path = "/users/export",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 400, description = "No matches or missing fieldValue", body = ErrorEnvelope)
    )
)]
pub async fn export_users(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let value = match request.field_value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::bad_request("Invalid request body")),
    };

    let users = state.repo.find_matching(&value).await?;
    if users.is_empty() {
        return Err(ApiError::bad_request("No users found for export"));
    }

    let bytes = export::render_csv(&users)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"exported_users.csv\"",
            ),
        ],
        bytes,
    ))
}
