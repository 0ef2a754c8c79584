/*!
 * Authenticated user extractor
 *
 * Responsibility:
 * - request に付いた principal を型付きの AuthUser に変換して handler に渡す
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - Auth<T> (identity injection marker)
 * - AuthUser / Principal / Authentication
 * - supports_binding / resolve_identity
 */

mod core;
mod types;

pub use self::core::{Auth, AuthError, ParameterMetadata, resolve_identity, supports_binding};
pub use self::types::{AuthUser, Authentication, Principal};
