use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    pub share: ShareConfig,
    pub admin: AdminConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the web client. Used for CORS and for building share links.
    pub frontend_url: String,
    /// Externally reachable base URL of this service. Public URLs of stored
    /// uploads are built from it.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for auth endpoints (e.g. /api/auth/login)
    pub auth_per_second: u32,
    /// Burst size for auth endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory where uploaded objects are written. Served under `/uploads`.
    pub base_path: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    pub default_expiration_days: i64,
    pub max_expiration_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Accounts registered with one of these emails become system administrators.
    pub bootstrap_emails: Vec<String>,
    /// Whether bootstrapped administrators are restricted to the admin panel.
    pub system_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogFormat {
    Text,
    Json,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_email_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: port
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/app.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?,
                expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            storage: StorageConfig {
                base_path: env::var("STORAGE_PATH")
                    .unwrap_or_else(|_| "data/uploads".to_string()),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| "5242880".to_string())
                    .parse()
                    .unwrap_or(5 * 1024 * 1024),
            },
            share: ShareConfig {
                default_expiration_days: env::var("SHARE_DEFAULT_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
                max_expiration_days: env::var("SHARE_MAX_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "365".to_string())
                    .parse()
                    .unwrap_or(365),
            },
            admin: AdminConfig {
                bootstrap_emails: env::var("ADMIN_EMAILS")
                    .map(|v| parse_email_list(&v))
                    .unwrap_or_default(),
                system_only: env::var("ADMIN_SYSTEM_ONLY")
                    .ok()
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(false),
            },
            log_format: match env::var("LOG_FORMAT") {
                Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    /// Public link for a share token, rendered by the web client.
    pub fn share_url(&self, token: &str) -> String {
        format!(
            "{}/share/{}",
            self.server.frontend_url.trim_end_matches('/'),
            token
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
                public_base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://data/app.db".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: String::new(),
                expiration_hours: 24,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            storage: StorageConfig {
                base_path: "data/uploads".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            share: ShareConfig {
                default_expiration_days: 7,
                max_expiration_days: 365,
            },
            admin: AdminConfig {
                bootstrap_emails: Vec::new(),
                system_only: false,
            },
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_admin_email_list() {
        assert_eq!(
            parse_email_list(" Alice@Example.com, ,bob@example.com "),
            vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
        );
        assert!(parse_email_list("").is_empty());
    }

    #[test]
    fn parses_boolean_flags() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn share_url_joins_frontend_origin() {
        let mut config = Config::default();
        config.server.frontend_url = "https://pets.example.com/".to_string();
        assert_eq!(
            config.share_url("abc"),
            "https://pets.example.com/share/abc"
        );
    }
}
