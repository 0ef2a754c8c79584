/*
 * Responsibility
 * - /auth (signup / signin) の request/response DTO
 * - validate() で形式チェックのみ行う (存在確認は handler 側)
 */
use serde::{Deserialize, Serialize};

use crate::models::UserRole;

const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err("email is invalid"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub user_role: String,
}

impl SignupRequest {
    /// 形式チェック + role の解釈
    pub fn validate(&self) -> Result<UserRole, (&'static str, &'static str)> {
        validate_email(&self.email).map_err(|m| ("INVALID_EMAIL", m))?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(("INVALID_PASSWORD", "password must be at least 8 characters"));
        }
        if self.nickname.trim().is_empty() {
            return Err(("INVALID_NICKNAME", "nickname is required"));
        }
        self.user_role
            .parse::<UserRole>()
            .map_err(|_| ("INVALID_USER_ROLE", "userRole must be USER or ADMIN"))
    }
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

impl SigninRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// `Bearer <jwt>` (Authorization ヘッダにそのまま入れられる形)
    pub bearer_token: String,
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_in: u64) -> Self {
        Self {
            bearer_token: format!("Bearer {token}"),
            expires_in,
        }
    }
}
