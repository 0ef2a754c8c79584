/*
 * Responsibility
 * - 複数レイヤー (extractor / repo / service) から参照されるドメイン値
 */
pub mod user_role;

pub use user_role::UserRole;
