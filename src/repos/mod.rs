/*
 * Responsibility
 * - 永続化レイヤーの公開インターフェース
 * - handler からは trait (TodoStore / UserStore) 経由で触る
 */
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod query;
pub mod todo_repo;
pub mod user_repo;
