/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth (route policy + jwt filter) と横断的な HTTP レイヤー
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
