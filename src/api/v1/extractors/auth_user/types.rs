/*
 * Responsibility
 * - Handler から見える「認証済みユーザー」の型
 * - middleware (jwt filter) が request extensions に格納する Authentication の型
 *
 * Notes
 * - トークン検証は middleware/services 側の責務
 * - ここは「型（契約）」として固定化する
 */
use crate::models::UserRole;

/// 上流の認証 filter が作る principal。
///
/// `subject` には数値のユーザー ID が文字列で入る (エンコード規約)。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            authorities,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

/// request ごとの認証コンテキスト (request extensions に入る)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// 公開ルートでトークンが無い / 無効だった
    Anonymous,
    Authenticated(Principal),
}

/// 認証済みリクエストから解決されたユーザー。request 単位で作られて捨てられる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
}
