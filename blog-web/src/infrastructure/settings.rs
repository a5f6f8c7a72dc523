use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) database_url: String,
    pub(crate) db_max_connections: u32,
    pub(crate) jwt_secret: String,
    pub(crate) jwt_ttl_seconds: i64,
    pub(crate) http_addr: String,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) log_level: String,
    pub(crate) http_request_body_limit_bytes: usize,
    pub(crate) http_concurrency_limit: usize,
    pub(crate) http_request_timeout_secs: u64,
    pub(crate) posts_per_page: u32,
    pub(crate) session_cookie_secure: bool,
    /// When set, the JSON API applies the author-only rule for post edits
    /// that the web pages always apply.
    pub(crate) api_enforce_ownership: bool,
    pub(crate) templates_dir: String,
    pub(crate) static_dir: String,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        let database_url = get_required("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt_secret = get_required("JWT_SECRET").context("JWT_SECRET is required")?;
        let jwt_ttl_seconds: i64 = std::env::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("Failed to parse JWT_TTL_SECONDS, expecting integer")?;

        if jwt_secret.chars().count() < 32 {
            return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
        }

        let db_max_connections: u32 = parse_usize_env("DB_MAX_CONNECTIONS", 10)?
            .try_into()
            .context("DB_MAX_CONNECTIONS is too large")?;
        let http_addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origins = parse_cors_origins(
            std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:8080,http://127.0.0.1:8080".to_string()),
        );
        let log_level = std::env::var("LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());
        let http_request_body_limit_bytes =
            parse_usize_env("HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = parse_usize_env("HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_u64_env("HTTP_REQUEST_TIMEOUT_SECS", 10)?;
        let posts_per_page: u32 = parse_usize_env("POSTS_PER_PAGE", 5)?
            .try_into()
            .context("POSTS_PER_PAGE is too large")?;
        let session_cookie_secure = parse_bool_env("SESSION_COOKIE_SECURE", false)?;
        let api_enforce_ownership = parse_bool_env("API_ENFORCE_OWNERSHIP", false)?;
        let templates_dir = std::env::var("TEMPLATES_DIR")
            .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string());
        let static_dir = std::env::var("STATIC_DIR")
            .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string());

        Ok(Self {
            database_url,
            db_max_connections,
            jwt_secret,
            jwt_ttl_seconds,
            http_addr,
            cors_origins,
            log_level,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
            posts_per_page,
            session_cookie_secure,
            api_enforce_ownership,
            templates_dir,
            static_dir,
        })
    }
}

fn get_required(key: &str) -> Result<String> {
    let value = std::env::var(key)?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_cors_origins(raw: String) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64> {
    let value = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => parse_bool(&raw)
            .with_context(|| format!("Failed to parse {key}, expecting boolean")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("unexpected boolean value '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_cors_origins};

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true").expect("valid"));
        assert!(parse_bool(" ON ").expect("valid"));
        assert!(!parse_bool("0").expect("valid"));
        assert!(!parse_bool("no").expect("valid"));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn parse_cors_origins_skips_blank_entries() {
        let origins = parse_cors_origins(" http://a.test , ,http://b.test".to_string());
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
