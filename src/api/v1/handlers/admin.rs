/*
 * Responsibility
 * - PATCH /admin/users/{user_id} (role 変更)
 * - ADMIN 以外は jwt filter の時点で 403 になるので、ここでは権限を見ない
 */
use axum::{extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::users::ChangeUserRoleRequest,
        extractors::{ApiJson, ApiPath, Auth, AuthUser},
    },
    error::AppError,
    state::AppState,
};

pub async fn change_user_role(
    State(state): State<AppState>,
    Auth(admin): Auth<AuthUser>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(req): ApiJson<ChangeUserRoleRequest>,
) -> Result<StatusCode, AppError> {
    let role = req
        .validate()
        .map_err(|m| AppError::bad_request("INVALID_USER_ROLE", m))?;

    if !state.users.update_role(user_id, role).await? {
        return Err(AppError::not_found("user"));
    }

    tracing::info!(admin_id = admin.user_id, user_id, role = %role, "user role changed");

    Ok(StatusCode::NO_CONTENT)
}
