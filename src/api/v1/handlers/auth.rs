/*
 * Responsibility
 * - POST /auth/signup, POST /auth/signin
 * - DTO validation → password hash / 照合 → access token 発行
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::auth::{SigninRequest, SignupRequest, TokenResponse},
        extractors::ApiJson,
    },
    error::AppError,
    repos::{
        error::RepoError,
        user_repo::{NewUser, UserRow},
    },
    state::AppState,
};

fn issue_token(state: &AppState, user: &UserRow) -> Result<TokenResponse, AppError> {
    let token = state
        .jwt
        .issue(user.id, &user.email, &user.nickname, user.role)?;
    Ok(TokenResponse::bearer(token, state.jwt.ttl_seconds()))
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let role = req
        .validate()
        .map_err(|(code, message)| AppError::bad_request(code, message))?;

    let password_hash = state.passwords.encode(&req.password)?;

    let user = state
        .users
        .create(NewUser {
            email: req.email.trim().to_string(),
            password_hash,
            nickname: req.nickname.trim().to_string(),
            role,
        })
        .await
        .map_err(|e| match e {
            RepoError::Conflict => {
                AppError::bad_request("EMAIL_ALREADY_EXISTS", "email is already registered")
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, role = %user.role, "user signed up");

    Ok((StatusCode::CREATED, Json(issue_token(&state, &user)?)))
}

pub async fn signin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_REQUEST", m))?;

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or_else(|| AppError::bad_request("USER_NOT_FOUND", "user is not registered"))?;

    if !state.passwords.matches(&req.password, &user.password) {
        return Err(AppError::Unauthorized);
    }

    Ok(Json(issue_token(&state, &user)?))
}
