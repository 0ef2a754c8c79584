/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

// HS256 の鍵長の下限 (bytes)
const MIN_JWT_SECRET_LEN: usize = 32;
// access token の寿命の上限 (30 日)
const MAX_ACCESS_TOKEN_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,

    pub jwt_secret: Vec<u8>,
    pub jwt_issuer: String,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,

    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets (database credentials / jwt key)
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database_max_connections", &self.database_max_connections)
            .field("run_migrations", &self.run_migrations)
            .field("jwt_issuer", &self.jwt_issuer)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` から設定を組み立てる。テストでは env を触らずに値を渡せる。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);

        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout_seconds = lookup("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(30);

        let request_body_limit_bytes = lookup("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let jwt_secret = lookup("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        let jwt_secret = STANDARD
            .decode(jwt_secret.trim())
            .map_err(|_| ConfigError::Invalid("JWT_SECRET_KEY"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid("JWT_SECRET_KEY"));
        }

        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or_else(|| "todo-api".to_string());

        let access_token_ttl_seconds = match lookup("ACCESS_TOKEN_TTL_SECONDS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|n| (1..=MAX_ACCESS_TOKEN_TTL_SECONDS).contains(n))
                .ok_or(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => 3600,
        };

        let access_token_leeway_seconds = lookup("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let password_hash_memory_kib = lookup("PASSWORD_HASH_MEMORY_KIB")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(19 * 1024);

        let password_hash_iterations = lookup("PASSWORD_HASH_ITERATIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(2);

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            run_migrations,
            app_env,
            cors_allowed_origins,
            request_timeout_seconds,
            request_body_limit_bytes,
            jwt_secret,
            jwt_issuer,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            password_hash_memory_kib,
            password_hash_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    // 32 bytes of 'k'
    const SECRET_B64: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("JWT_SECRET_KEY", SECRET_B64),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.database_max_connections, 10);
        assert!(!config.run_migrations);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.jwt_secret, vec![b'k'; 32]);
        assert_eq!(config.jwt_issuer, "todo-api");
        assert_eq!(config.access_token_ttl_seconds, 3600);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.request_body_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn reads_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("RUN_MIGRATIONS", "true"),
            ("APP_ENV", "prod"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("JWT_SECRET_KEY", SECRET_B64),
            ("JWT_ISSUER", "issuer-x"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert!(config.run_migrations);
        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.jwt_issuer, "issuer-x");
    }

    #[test]
    fn rejects_missing_database_url() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET_KEY", SECRET_B64)]))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn rejects_short_or_malformed_jwt_secret() {
        let short = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("JWT_SECRET_KEY", "c2hvcnQ="),
        ]))
        .err()
        .unwrap();
        assert_eq!(short, ConfigError::Invalid("JWT_SECRET_KEY"));

        let malformed = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("JWT_SECRET_KEY", "not base64 !!"),
        ]))
        .err()
        .unwrap();
        assert_eq!(malformed, ConfigError::Invalid("JWT_SECRET_KEY"));
    }

    #[test]
    fn rejects_out_of_range_token_ttl() {
        for ttl in ["0", "2592001", "18446744073709551615", "soon"] {
            let err = Config::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://localhost/todos"),
                ("JWT_SECRET_KEY", SECRET_B64),
                ("ACCESS_TOKEN_TTL_SECONDS", ttl),
            ]))
            .err()
            .unwrap();
            assert_eq!(err, ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"), "{ttl}");
        }

        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("JWT_SECRET_KEY", SECRET_B64),
            ("ACCESS_TOKEN_TTL_SECONDS", "2592000"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_ttl_seconds, 2_592_000);
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = Config::from_lookup(lookup_from(&[
            ("PORT", "http"),
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("JWT_SECRET_KEY", SECRET_B64),
        ]))
        .err()
        .unwrap();
        assert_eq!(err, ConfigError::Invalid("PORT"));
    }
}
