//! Route classification for the `/api/v1` router.
//!
//! Paths are matched after `nest` strips the version prefix,
//! so `/auth/signin` here is `/api/v1/auth/signin` on the wire.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// トークン不要 (あれば検証して使う)
    Public,
    /// ADMIN authority が必要
    AdminOnly,
    /// 有効なトークンが必要
    Authenticated,
}

const PUBLIC_PREFIXES: &[&str] = &["/auth"];
const ADMIN_PREFIXES: &[&str] = &["/admin"];

// "/auth" と "/auth/..." は一致、"/authors" は不一致
fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn classify(path: &str) -> RoutePolicy {
    if PUBLIC_PREFIXES.iter().any(|p| is_under(path, p)) {
        RoutePolicy::Public
    } else if ADMIN_PREFIXES.iter().any(|p| is_under(path, p)) {
        RoutePolicy::AdminOnly
    } else {
        RoutePolicy::Authenticated
    }
}
