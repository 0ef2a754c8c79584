/*
 * Responsibility
 * - Users (admin) の request/response DTO
 */
use serde::Deserialize;

use crate::models::UserRole;

#[derive(Debug, Deserialize)]
pub struct ChangeUserRoleRequest {
    pub role: String,
}

impl ChangeUserRoleRequest {
    pub fn validate(&self) -> Result<UserRole, &'static str> {
        self.role
            .parse::<UserRole>()
            .map_err(|_| "role must be USER or ADMIN")
    }
}
