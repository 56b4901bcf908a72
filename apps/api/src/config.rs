use anyhow::{Context, Result};

const DEFAULT_ENTRY_FETCH_LIMIT: i64 = 300;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional: without it the service boots but every ask request fails with a
    /// configuration error.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Page size of the per-request entry fetch.
    pub entry_fetch_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            entry_fetch_limit: parse_fetch_limit(std::env::var("ENTRY_FETCH_LIMIT").ok())?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_fetch_limit(raw: Option<String>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_ENTRY_FETCH_LIMIT);
    };
    let limit = raw
        .trim()
        .parse::<i64>()
        .context("ENTRY_FETCH_LIMIT must be an integer")?;
    anyhow::ensure!(limit > 0, "ENTRY_FETCH_LIMIT must be positive, got {limit}");
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_limit_defaults() {
        assert_eq!(parse_fetch_limit(None).unwrap(), 300);
    }

    #[test]
    fn test_fetch_limit_parsed() {
        assert_eq!(parse_fetch_limit(Some(" 50 ".to_string())).unwrap(), 50);
    }

    #[test]
    fn test_fetch_limit_rejects_garbage() {
        assert!(parse_fetch_limit(Some("lots".to_string())).is_err());
        assert!(parse_fetch_limit(Some("0".to_string())).is_err());
    }
}
