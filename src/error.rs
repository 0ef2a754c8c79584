/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / AuthError / JwtError などを統一的に変換
 */
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::v1::extractors::auth_user::AuthError;
use crate::repos::error::RepoError;
use crate::services::auth::jwt::JwtError;
use crate::services::auth::password::PasswordError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    /// axum extractor の rejection (status はそのまま使う)
    #[error("rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::Rejected { status, message } => {
                let code = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
                    StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                    _ => "INVALID_REQUEST",
                };
                (status, code, message)
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "forbidden".into()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "conflict"),
            RepoError::MissingReference => {
                AppError::bad_request("INVALID_REFERENCE", "referenced resource does not exist")
            }
            RepoError::MultipleRows { .. } => {
                tracing::error!(error = %e, "repository invariant violated");
                AppError::Internal
            }
            RepoError::Db(_) => {
                tracing::error!(error = ?e, "repository failure");
                AppError::Internal
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => AppError::Unauthorized,
            // filter と resolver の取り決め違反: 呼び出し側には 401、ログには残す
            AuthError::MalformedIdentity(_) => {
                tracing::error!(error = %e, "unexpected principal shape");
                AppError::Unauthorized
            }
            AuthError::Configuration { .. } => {
                tracing::error!(error = %e, "identity injection misconfigured");
                AppError::Internal
            }
        }
    }
}

impl From<JwtError> for AppError {
    fn from(e: JwtError) -> Self {
        tracing::error!(error = %e, "failed to issue access token");
        AppError::Internal
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "password encoder failure");
        AppError::Internal
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for AppError {
                fn from(r: $rejection) -> Self {
                    tracing::debug!(error = %r, "request rejected by extractor");
                    AppError::Rejected {
                        status: r.status(),
                        message: r.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(JsonRejection, PathRejection, QueryRejection);
