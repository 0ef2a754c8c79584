/*
 * Responsibility
 * - /todos 系 handler (作成 / 単体取得 / 一覧)
 * - 作成者は Auth<AuthUser> で受け取る (トークンの中身を直接触らない)
 * - 単体取得・一覧は owner を left join で解決した結果を返す
 */
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::todos::{CreateTodoRequest, ListTodosParams, PageResponse, TodoResponse},
        extractors::{ApiJson, ApiPath, ApiQuery, Auth, AuthUser},
    },
    error::AppError,
    repos::{
        error::RepoError,
        todo_repo::{self, NewTodo},
    },
    state::AppState,
};

pub async fn save_todo(
    State(state): State<AppState>,
    Auth(user): Auth<AuthUser>,
    ApiJson(req): ApiJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_REQUEST", m))?;

    let row = state
        .todos
        .create(NewTodo {
            title: req.title,
            contents: req.contents,
            weather: req.weather,
            user_id: user.user_id,
        })
        .await
        .map_err(|e| match e {
            // トークンは有効だがユーザー行が消えている
            RepoError::MissingReference => {
                tracing::warn!(user_id = user.user_id, "todo owner no longer exists");
                AppError::Unauthorized
            }
            other => other.into(),
        })?;

    tracing::debug!(todo_id = row.id, user_id = user.user_id, "todo created");

    // owner は join で読み直す (principal の email は subject のまま)
    let saved = todo_repo::find_with_owner(state.todos.as_ref(), row.id)
        .await?
        .ok_or(AppError::Internal)?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

pub async fn get_todo(
    State(state): State<AppState>,
    ApiPath(todo_id): ApiPath<i64>,
) -> Result<Json<TodoResponse>, AppError> {
    let row = todo_repo::find_with_owner(state.todos.as_ref(), todo_id)
        .await?
        .ok_or(AppError::not_found("todo"))?;

    Ok(Json(row.into()))
}

pub async fn get_todos(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListTodosParams>,
) -> Result<Json<PageResponse<TodoResponse>>, AppError> {
    let (filter, page) = params
        .into_query()
        .map_err(|m| AppError::bad_request("INVALID_REQUEST", m))?;

    let page = todo_repo::list(state.todos.as_ref(), &filter, page).await?;

    Ok(Json(PageResponse::from_page(page)))
}
