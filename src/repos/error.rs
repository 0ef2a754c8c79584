/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - "見つからない" はエラーではなく Option::None で返す
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
    /// 外部キーの参照先が存在しない
    #[error("referenced row does not exist")]
    MissingReference,
    /// 一意キーで引いたのに複数行が返った。切り捨てずに失敗させる。
    #[error("expected at most one {entity} row, got {count}")]
    MultipleRows { entity: &'static str, count: usize },
}

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e {
            match dbe.code().as_deref() {
                Some("23505") => return RepoError::Conflict,
                Some("23503") => return RepoError::MissingReference,
                _ => {}
            }
        }
        RepoError::Db(e)
    }
}
