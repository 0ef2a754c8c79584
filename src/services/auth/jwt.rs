use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::models::UserRole;

// Errors returned by access-token issue / verification.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("token lifetime of {0}s is out of range")]
    TtlOutOfRange(u64),
}

/// Access token (JWT) claims.
///
/// `sub` は数値のユーザー ID を文字列で持つ (プロジェクト規約)。
/// `userRole` は principal の authority としてそのまま使われる。
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    iss: String,
    sub: String,
    email: String,
    #[serde(default)]
    nickname: String,
    #[serde(rename = "userRole")]
    user_role: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// 署名・exp・iss の検証を通過したトークンの中身
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub email: String,
    pub nickname: String,
    pub role: String,
    pub jti: String,
}

/// HS256 access-token issuer / verifier.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_seconds: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &[u8], issuer: &str, ttl_seconds: u64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            ttl_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            config.access_token_ttl_seconds,
            config.access_token_leeway_seconds,
        )
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Issue an access token whose subject is the numeric user id.
    pub fn issue(
        &self,
        user_id: i64,
        email: &str,
        nickname: &str,
        role: UserRole,
    ) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(JwtError::TtlOutOfRange(self.ttl_seconds))?;
        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            email: email.to_string(),
            nickname: nickname.to_string(),
            user_role: role.as_str().to_string(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify signature / `exp` / `iss`, then require non-empty `sub` and `userRole`.
    ///
    /// Claim の意味 (sub が数値か、role が既知か) はここでは見ない。
    /// それは identity resolver の責務。
    pub fn verify(&self, token: &str) -> Result<VerifiedAccessToken, JwtError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(JwtError::EmptyClaim("sub"));
        }
        if claims.user_role.trim().is_empty() {
            return Err(JwtError::EmptyClaim("userRole"));
        }

        Ok(VerifiedAccessToken {
            subject: claims.sub,
            email: claims.email,
            nickname: claims.nickname,
            role: claims.user_role,
            jti: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> JwtService {
        JwtService::new(SECRET, "todo-api", 3600, 0)
    }

    fn sign(claims: &AccessTokenClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    fn claims(sub: &str, role: &str, exp_offset: i64) -> AccessTokenClaims {
        let now = Utc::now().timestamp();
        AccessTokenClaims {
            iss: "todo-api".to_string(),
            sub: sub.to_string(),
            email: "a@example.com".to_string(),
            nickname: "nick".to_string(),
            user_role: role.to_string(),
            iat: now,
            exp: now + exp_offset,
            jti: "jti-1".to_string(),
        }
    }

    #[test]
    fn issued_token_verifies_with_subject_and_role() {
        let jwt = service();
        let token = jwt.issue(42, "a@example.com", "alice", UserRole::Admin).unwrap();

        let verified = jwt.verify(&token).unwrap();
        assert_eq!(verified.subject, "42");
        assert_eq!(verified.email, "a@example.com");
        assert_eq!(verified.nickname, "alice");
        assert_eq!(verified.role, "ADMIN");
        assert!(!verified.jti.is_empty());
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let other = JwtService::new(b"ffffffffffffffffffffffffffffffff", "todo-api", 3600, 0);
        let token = other.issue(1, "a@example.com", "bob", UserRole::User).unwrap();

        assert!(matches!(service().verify(&token), Err(JwtError::Jwt(_))));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let other = JwtService::new(SECRET, "someone-else", 3600, 0);
        let token = other.issue(1, "a@example.com", "bob", UserRole::User).unwrap();

        assert!(matches!(service().verify(&token), Err(JwtError::Jwt(_))));
    }

    #[test]
    fn refuses_to_issue_with_unrepresentable_lifetime() {
        let jwt = JwtService::new(SECRET, "todo-api", u64::MAX, 0);
        assert!(matches!(
            jwt.issue(1, "a@example.com", "bob", UserRole::User),
            Err(JwtError::TtlOutOfRange(u64::MAX))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(&claims("1", "USER", -600));
        assert!(matches!(service().verify(&token), Err(JwtError::Jwt(_))));
    }

    #[test]
    fn rejects_empty_subject_or_role() {
        let token = sign(&claims(" ", "USER", 600));
        assert!(matches!(
            service().verify(&token),
            Err(JwtError::EmptyClaim("sub"))
        ));

        let token = sign(&claims("1", "", 600));
        assert!(matches!(
            service().verify(&token),
            Err(JwtError::EmptyClaim("userRole"))
        ));
    }

    #[test]
    fn passes_unparsed_claims_through() {
        // 値の解釈は resolver 側。ここでは形だけ見る。
        let token = sign(&claims("not-a-number", "UNKNOWN_ROLE", 600));
        let verified = service().verify(&token).unwrap();
        assert_eq!(verified.subject, "not-a-number");
        assert_eq!(verified.role, "UNKNOWN_ROLE");
    }
}
