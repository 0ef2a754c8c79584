use std::any::{Any, TypeId, type_name};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use thiserror::Error;

use crate::error::AppError;
use crate::models::UserRole;

use super::{AuthUser, Authentication};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// identity marker と AuthUser 型が揃っていない (プログラミング上の誤り)
    #[error("identity injection requires the Auth marker together with AuthUser (got {type_name})")]
    Configuration { type_name: &'static str },
    #[error("no authenticated user present")]
    Unauthenticated,
    /// filter と resolver の間の取り決め違反
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),
}

/// handler 引数 1 つ分の情報 (宣言型 + marker の有無)
#[derive(Debug, Clone, Copy)]
pub struct ParameterMetadata {
    pub declared_type: TypeId,
    pub type_name: &'static str,
    pub has_auth_marker: bool,
}

impl ParameterMetadata {
    pub fn of<T: Any>(has_auth_marker: bool) -> Self {
        Self {
            declared_type: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            has_auth_marker,
        }
    }
}

/// marker と AuthUser 型は両方あるか、両方ないかのどちらか。
///
/// - 両方: `Ok(true)`
/// - どちらもなし: `Ok(false)` (この resolver の担当外)
/// - 片方だけ: `AuthError::Configuration`
pub fn supports_binding(param: &ParameterMetadata) -> Result<bool, AuthError> {
    let is_auth_user = param.declared_type == TypeId::of::<AuthUser>();

    if param.has_auth_marker != is_auth_user {
        return Err(AuthError::Configuration {
            type_name: param.type_name,
        });
    }

    Ok(param.has_auth_marker)
}

/// Principal -> AuthUser の唯一の変換点。
///
/// subject を数値 ID として読み、email にも subject をそのまま使う。
/// role は最初の authority から決める。どれか 1 つでも読めなければ全体が失敗する。
pub fn resolve_identity(authentication: Option<&Authentication>) -> Result<AuthUser, AuthError> {
    let principal = match authentication {
        Some(Authentication::Authenticated(principal)) => principal,
        Some(Authentication::Anonymous) | None => return Err(AuthError::Unauthenticated),
    };

    let user_id = principal
        .subject
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            AuthError::MalformedIdentity(format!(
                "subject {:?} is not a positive user id",
                principal.subject
            ))
        })?;

    let authority = principal
        .authorities
        .first()
        .ok_or_else(|| AuthError::MalformedIdentity("principal has no authority".to_string()))?;

    let role = authority
        .parse::<UserRole>()
        .map_err(|e| AuthError::MalformedIdentity(e.to_string()))?;

    Ok(AuthUser {
        user_id,
        email: principal.subject.clone(),
        role,
    })
}

/// identity injection marker.
///
/// `Auth(user): Auth<AuthUser>` として handler 引数に書く。
/// jwt filter が request extensions に Authentication を入れている前提。
///
/// extractor は `Auth<AuthUser>` にだけ実装する。marker と型の組み合わせ違い
/// (`Auth<String>` など) は handler 登録の時点でコンパイルエラーになる。
#[derive(Debug, Clone)]
pub struct Auth<T = AuthUser>(pub T);

impl<S> FromRequestParts<S> for Auth<AuthUser>
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        supports_binding(&ParameterMetadata::of::<AuthUser>(true))?;

        let user = resolve_identity(parts.extensions.get::<Authentication>())?;
        Ok(Auth(user))
    }
}
