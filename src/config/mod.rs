use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secrets shipped for local development only. `validate` refuses them in staging and production.
const DEV_TOKEN_SECRET: &str = "gfe895tu359hjteijte4hjaurhtuh59yjh5e";
const DEV_SESSION_SECRET: &str = "development-session-secret-change-me-please";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "staging" | "stage" => Ok(Environment::Staging),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub require_https: bool,
    pub token_secret: String,
    pub token_issuer: String,
    pub token_expiry_months: u32,
    pub session_secret: String,
    pub session_cookie_name: String,
    pub password: PasswordConfig,
}

/// Argon2id work factors. Raising them slows brute force and logins alike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Session secret must be at least 32 bytes")]
    SessionSecretTooShort,

    #[error("Development secret used outside development: {0}")]
    DevelopmentSecret(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = env::var("APP_ENV")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Environment::Development);

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    /// Per-field overrides from the process environment on top of a preset.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("BLOG_ADDR") {
            self.server.addr = v;
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("BLOG_TOKEN_SECRET") {
            self.security.token_secret = v;
        }
        if let Ok(v) = env::var("BLOG_TOKEN_ISSUER") {
            self.security.token_issuer = v;
        }
        if let Ok(v) = env::var("BLOG_TOKEN_EXPIRY_MONTHS") {
            self.security.token_expiry_months = v.parse().unwrap_or(self.security.token_expiry_months);
        }
        if let Ok(v) = env::var("BLOG_SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("BLOG_SESSION_COOKIE") {
            self.security.session_cookie_name = v;
        }
        if let Ok(v) = env::var("BLOG_PASSWORD_MEMORY_KIB") {
            self.security.password.memory_kib = v.parse().unwrap_or(self.security.password.memory_kib);
        }
        if let Ok(v) = env::var("BLOG_PASSWORD_ITERATIONS") {
            self.security.password.iterations = v.parse().unwrap_or(self.security.password.iterations);
        }

        self
    }

    /// Checks the invariants the auth subsystem relies on before anything is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.addr.is_empty() {
            return Err(ConfigError::Missing("BLOG_ADDR"));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.security.token_secret.is_empty() {
            return Err(ConfigError::Missing("BLOG_TOKEN_SECRET"));
        }
        if self.security.token_issuer.is_empty() {
            return Err(ConfigError::Missing("BLOG_TOKEN_ISSUER"));
        }
        if self.security.session_secret.len() < 32 {
            return Err(ConfigError::SessionSecretTooShort);
        }

        if self.environment != Environment::Development {
            if self.security.token_secret == DEV_TOKEN_SECRET {
                return Err(ConfigError::DevelopmentSecret("BLOG_TOKEN_SECRET"));
            }
            if self.security.session_secret == DEV_SESSION_SECRET {
                return Err(ConfigError::DevelopmentSecret("BLOG_SESSION_SECRET"));
            }
        }

        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                addr: "127.0.0.1:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://goblog.db".to_string(),
                max_connections: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                require_https: false,
                token_secret: DEV_TOKEN_SECRET.to_string(),
                token_issuer: "MyOrganisation".to_string(),
                token_expiry_months: 1,
                session_secret: DEV_SESSION_SECRET.to_string(),
                session_cookie_name: "blog".to_string(),
                password: PasswordConfig::default(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://goblog.db".to_string(),
                max_connections: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                require_https: true,
                token_secret: DEV_TOKEN_SECRET.to_string(),
                token_issuer: "MyOrganisation".to_string(),
                token_expiry_months: 1,
                session_secret: DEV_SESSION_SECRET.to_string(),
                session_cookie_name: "blog".to_string(),
                password: PasswordConfig::default(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://goblog.db".to_string(),
                max_connections: 20,
            },
            security: SecurityConfig {
                enable_cors: false,
                require_https: true,
                // Must come from the environment; validate() rejects the dev values
                token_secret: DEV_TOKEN_SECRET.to_string(),
                token_issuer: "MyOrganisation".to_string(),
                token_expiry_months: 1,
                session_secret: DEV_SESSION_SECRET.to_string(),
                session_cookie_name: "blog".to_string(),
                password: PasswordConfig {
                    memory_kib: 65536,
                    iterations: 3,
                    parallelism: 4,
                },
            },
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}
