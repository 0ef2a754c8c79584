/*
 * Responsibility
 * - handler 引数として使う extractor の公開口
 */
pub mod auth_user;
pub mod request;

pub use auth_user::{Auth, AuthUser, Authentication, Principal};
pub use request::{ApiJson, ApiPath, ApiQuery};
