//! 認証まわりの middleware
//!
//! - `policy`: パスを public / admin-only / authenticated に分類する
//! - `jwt_filter`: Bearer トークンを検証して `Authentication` を extensions に入れる
pub mod jwt_filter;
pub mod policy;
