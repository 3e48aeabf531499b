use anyhow::{Context, Result};

/// Fallback when no backend URL is configured (local dev server).
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Client configuration loaded from environment variables.
/// Everything is optional — the client falls back to the local backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the generation backend, without a trailing slash.
    pub api_base_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = normalize_base_url(&api_base_url)
            .with_context(|| format!("API_BASE_URL '{api_base_url}' is not a valid URL"))?;

        Ok(Config {
            api_base_url,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Strips trailing slashes so endpoint paths can be appended verbatim.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        anyhow::bail!("expected an http(s) URL");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/").unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_normalize_keeps_clean_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com").unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_normalize_rejects_non_http() {
        assert!(normalize_base_url("ftp://example.com").is_err());
    }
}
