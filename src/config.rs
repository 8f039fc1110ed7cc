// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Syntax identifiers accepted for quiz code and code snippets.
pub const SYNTAX_CHOICES: &[&str] = &[
    "as3",
    "bash",
    "c",
    "cpp",
    "csharp",
    "css",
    "html",
    "java",
    "js",
    "make",
    "objective-c",
    "perl",
    "php",
    "python",
    "sql",
    "ruby",
    "vb.net",
    "xml",
    "xslt",
];

pub const DEFAULT_SYNTAX: &str = "html";

/// URL prefix under which `MEDIA_ROOT` is served.
pub const MEDIA_URL: &str = "/media";

/// Auth endpoints: sustained requests per second and burst size per client IP.
pub const AUTH_RATE_PER_SECOND: u64 = 2;
pub const AUTH_RATE_BURST: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Shared collaboration documents handed out to lectures created without one.
    pub collab_doc_pool: Vec<String>,
    pub cache_ttl_secs: u64,
    /// Shared cache store; the in-process cache is used when unset.
    pub redis_url: Option<String>,
    pub media_root: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let collab_doc_pool = env::var("COLLAB_DOC_POOL")
            .map(|v| parse_doc_pool(&v))
            .unwrap_or_default();

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty());

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            collab_doc_pool,
            cache_ttl_secs,
            redis_url,
            media_root,
        }
    }
}

/// Splits a comma-separated list of URLs, dropping blanks.
fn parse_doc_pool(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
