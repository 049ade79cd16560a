//! Built-in defaults. Every value here can be overridden by the config
//! file or the environment; the two secrets are development placeholders
//! that the guard rails warn about.

pub const DEFAULT_TOKEN_SECRET: &str = "gatehouse-dev-token-secret-do-not-deploy";
pub const DEFAULT_PASSWORD_PEPPER: &str = "gatehouse-dev-pepper-do-not-deploy";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DATABASE_CONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_DATABASE_CONNECT_BACKOFF_SECS: u64 = 2;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

pub const DEFAULT_SSO_HOST: &str = "0.0.0.0";
pub const DEFAULT_SSO_PORT: u16 = 8081;
pub const DEFAULT_SSO_AUTH_SERVICE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SSO_REDIRECT: &str = "/";
pub const DEFAULT_SSO_VERIFY_TIMEOUT_SECS: u64 = 3;
