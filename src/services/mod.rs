/*
 * Responsibility
 * - handler / middleware から使うアプリケーションサービス
 */
pub mod auth;
