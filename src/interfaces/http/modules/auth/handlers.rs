//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use super::dto::{LoginRequest, LoginResponse};
use crate::auth::jwt::{create_token, JwtConfig};
use crate::auth::password::verify_password;
use crate::domain::UserRepositoryInterface;
use crate::infrastructure::database::repositories::UserRepository;
use crate::interfaces::http::common::{ApiError, ErrorEnvelope, ValidatedJson};
use crate::interfaces::http::modules::users::dto::{UserDto, UserRequest};
use crate::interfaces::http::modules::users::handlers::{created_response, insert_user};

/// Auth handler state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub repo: Arc<UserRepository>,
    pub jwt_config: JwtConfig,
}

#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelope)
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.repo.find_by_username(&request.username).await?;

    // One generic message for both unknown username and wrong password,
    // so the response does not leak which usernames exist.
    let invalid = || ApiError::unauthorized("Invalid username or password");

    let Some(user) = user else {
        return Err(invalid());
    };

    let password_valid = verify_password(&request.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        return Err(invalid());
    }

    let token =
        create_token(&user.id, &user.username, user.is_admin, &state.jwt_config).map_err(|e| {
            tracing::error!("failed to sign token: {}", e);
            ApiError::internal()
        })?;

    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    post,
    path = "/users/register",
    tag = "Authentication",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid body or duplicate username", body = ErrorEnvelope)
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = insert_user(&state.repo, request).await?;
    Ok(created_response(user))
}
