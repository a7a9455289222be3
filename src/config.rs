//! Application configuration loaded from environment variables.
//!
//! Secrets (the platform service-role key, JWT secret, dev-login
//! credentials) are injected via the environment and cached in memory at
//! startup. Nothing sensitive lives in source.

use std::env;

/// Deployment environment.
///
/// Dev-login and the session-injection function refuse to run in
/// `Production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Seeded dev-login credentials, present only outside production.
#[derive(Debug, Clone)]
pub struct DevLoginConfig {
    /// Email of the seeded dev account
    pub email: String,
    /// Password for the password strategy
    pub password: String,
    /// Fixed OTP code accepted by the seeded account
    pub otp_code: Option<String>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Base URL of the hosted platform (auth/rest/functions endpoints)
    pub platform_url: String,
    /// Public (anon) API key for client-side calls
    pub anon_key: String,
    /// Frontend URL for CORS and magic-link redirects
    pub frontend_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Server port
    pub port: u16,

    // --- Secrets (injected via env) ---
    /// Service-role key for privileged server-side calls
    pub service_role_key: String,
    /// HS256 secret the platform signs access tokens with (raw bytes)
    pub jwt_secret: Vec<u8>,
    /// Seeded dev account, if configured
    pub dev_login: Option<DevLoginConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = Environment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        // Dev-login credentials are optional and ignored in production
        let dev_login = match (environment, env::var("DEV_LOGIN_EMAIL")) {
            (Environment::Production, _) | (_, Err(_)) => None,
            (Environment::Development, Ok(email)) => Some(DevLoginConfig {
                email,
                password: env::var("DEV_LOGIN_PASSWORD")
                    .map_err(|_| ConfigError::Missing("DEV_LOGIN_PASSWORD"))?,
                otp_code: env::var("DEV_LOGIN_OTP_CODE").ok(),
            }),
        };

        Ok(Self {
            platform_url: env::var("PLATFORM_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("PLATFORM_URL"))?,
            anon_key: env::var("PLATFORM_ANON_KEY")
                .map_err(|_| ConfigError::Missing("PLATFORM_ANON_KEY"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            environment,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            service_role_key: env::var("PLATFORM_SERVICE_ROLE_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PLATFORM_SERVICE_ROLE_KEY"))?,
            jwt_secret: env::var("PLATFORM_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("PLATFORM_JWT_SECRET"))?
                .into_bytes(),
            dev_login,
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            platform_url: "http://localhost:54321".to_string(),
            anon_key: "test_anon_key".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Development,
            port: 8080,
            service_role_key: "test_service_role_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum".to_vec(),
            dev_login: Some(DevLoginConfig {
                email: "dev@tradielink.test".to_string(),
                password: "dev-password".to_string(),
                otp_code: Some("123456".to_string()),
            }),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn test_config_test_default() {
        let config = Config::test_default();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.dev_login.is_some());
        assert_eq!(config.port, 8080);
    }
}
