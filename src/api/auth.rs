// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account registration and login. Both endpoints are on the gate's public
//! allow-list and return a fresh session token.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    auth::{password, AuthError},
    error::{ApiError, ErrorBody},
    models::{LoginRequest, RegisterRequest, TokenResponse},
    state::AppState,
};

/// Reject empty credentials before touching the store.
fn require_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::bad_request("Username must not be empty"));
    }
    if password.is_empty() {
        return Err(ApiError::bad_request("Password must not be empty"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Empty username or password", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(request) = payload?;
    let username = request.username.trim();
    require_credentials(username, &request.password)?;

    let password_hash = password::hash_password_async(request.password).await?;
    let email = request.email.filter(|email| !email.trim().is_empty());
    let account = state.accounts().create(username, password_hash, email)?;
    let token = state.tokens.issue_token(account.id)?;

    info!(account_id = account.id, "Account registered");
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Empty username or password", body = ErrorBody),
        (status = 401, description = "Incorrect login or password", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let username = request.username.trim();
    require_credentials(username, &request.password)?;

    let Some(account) = state.accounts().find_by_username(username)? else {
        return Err(AuthError::InvalidCredentials.into());
    };
    let matches =
        password::verify_password_async(request.password, account.password_hash.clone()).await?;
    if !matches {
        return Err(AuthError::InvalidCredentials.into());
    }
    let token = state.tokens.issue_token(account.id)?;

    info!(account_id = account.id, "Account logged in");
    Ok(Json(TokenResponse { token }))
}
