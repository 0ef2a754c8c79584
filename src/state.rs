/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - todos / users: storage adapter (trait object)
 *   - jwt / passwords: 認証サービス
 * - Clone 前提で持つ (内部は Arc で Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{todo_repo::TodoStore, user_repo::UserStore};
use crate::services::auth::{JwtService, PasswordEncoder};

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt: Arc<JwtService>,
    pub passwords: Arc<PasswordEncoder>,
}

impl AppState {
    pub fn new(
        todos: Arc<dyn TodoStore>,
        users: Arc<dyn UserStore>,
        jwt: Arc<JwtService>,
        passwords: Arc<PasswordEncoder>,
    ) -> Self {
        Self {
            todos,
            users,
            jwt,
            passwords,
        }
    }
}
