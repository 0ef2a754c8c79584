use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(argon2::Error),
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Argon2id password encoder.
///
/// 出力は PHC 文字列 (パラメータと salt を含む) なので、
/// コストを変えても既存ハッシュはそのまま検証できる。
#[derive(Clone, Debug)]
pub struct PasswordEncoder {
    params: Params,
}

impl PasswordEncoder {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(PasswordError::Params)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn encode(&self, raw: &str) -> Result<String, PasswordError> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordError::Hash)?;

        let hash = self
            .argon2()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(PasswordError::Hash)?;

        Ok(hash.to_string())
    }

    /// 壊れたハッシュ文字列は「一致しない」として扱う
    pub fn matches(&self, raw: &str, encoded: &str) -> bool {
        match PasswordHash::new(encoded) {
            Ok(hash) => self
                .argon2()
                .verify_password(raw.as_bytes(), &hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> PasswordEncoder {
        PasswordEncoder::new(8, 1).unwrap()
    }

    #[test]
    fn encoded_password_matches_only_the_original() {
        let encoder = encoder();
        let hash = encoder.encode("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(encoder.matches("s3cret!", &hash));
        assert!(!encoder.matches("s3cret?", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let encoder = encoder();
        assert_ne!(
            encoder.encode("pw").unwrap(),
            encoder.encode("pw").unwrap()
        );
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!encoder().matches("pw", "not-a-phc-string"));
    }

    #[test]
    fn rejects_memory_cost_below_minimum() {
        assert!(matches!(
            PasswordEncoder::new(1, 1),
            Err(PasswordError::Params(_))
        ));
    }
}
