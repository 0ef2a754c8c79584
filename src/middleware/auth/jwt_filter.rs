//! access token (JWT) 検証 → Authentication を extensions に入れる
//!
//! - public ルート: トークン無し / 無効でも通す (Anonymous)
//! - それ以外: 有効なトークンが無ければ 401
//! - admin ルート: ADMIN authority が無ければ 403
//!
//! principal の subject はトークンの `sub` (数値のユーザー ID)、
//! authority は `userRole` の 1 つだけ。AuthUser への変換は extractor 側で行う。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::{Authentication, Principal};
use crate::error::AppError;
use crate::middleware::auth::policy::{self, RoutePolicy};
use crate::models::UserRole;
use crate::state::AppState;

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = middleware::auth::jwt_filter::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, jwt_filter))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn jwt_filter(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let policy = policy::classify(req.uri().path());

    let authentication = match bearer_token(req.headers()) {
        Some(token) => match state.jwt.verify(token) {
            Ok(verified) => {
                tracing::debug!(
                    sub = %verified.subject,
                    email = %verified.email,
                    nickname = %verified.nickname,
                    jti = %verified.jti,
                    "access token verified"
                );
                Authentication::Authenticated(Principal::new(verified.subject, vec![verified.role]))
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %req.uri().path(), "access token verification failed");
                if policy != RoutePolicy::Public {
                    return Err(AppError::Unauthorized);
                }
                Authentication::Anonymous
            }
        },
        None if policy == RoutePolicy::Public => Authentication::Anonymous,
        None => return Err(AppError::Unauthorized),
    };

    if policy == RoutePolicy::AdminOnly {
        let is_admin = matches!(
            &authentication,
            Authentication::Authenticated(principal)
                if principal.has_authority(UserRole::Admin.as_str())
        );
        if !is_admin {
            tracing::warn!(path = %req.uri().path(), "admin route denied");
            return Err(AppError::Forbidden);
        }
    }

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(authentication);

    Ok(next.run(req).await)
}
