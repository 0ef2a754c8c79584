/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /auth, /todos, /admin を並べ、jwt filter を v1 全体に掛ける
 * - どのパスが public / admin かは middleware::auth::policy が決める
 */
use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::api::v1::handlers::{
    admin::change_user_role,
    auth::{signin, signup},
    todos::{get_todo, get_todos, save_todo},
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/todos", get(get_todos).post(save_todo))
        .route("/todos/{todo_id}", get(get_todo))
        .route("/admin/users/{user_id}", patch(change_user_role));

    middleware::auth::jwt_filter::apply(router, state)
}
