//! Application configuration loaded from environment variables.
//!
//! Everything has a local-development default except where a wrong value
//! would silently misbehave, in which case loading fails.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which persistence backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Storage ---
    /// GCP project ID
    pub gcp_project_id: String,
    pub store: StoreKind,

    // --- Results site ---
    /// Base URL of the results site, without a trailing slash
    pub results_base_url: String,
    /// Minimum gap between the end of one request and the start of the next
    pub min_request_interval: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Optional file of User-Agent strings, one per line
    pub user_agents_file: Option<PathBuf>,

    // --- Cache ---
    /// How long a successful sync stays fresh
    pub cache_ttl: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            store: StoreKind::Memory,
            results_base_url: "https://www.swimmingresults.org".to_string(),
            min_request_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            user_agents_file: None,
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "firestore" => StoreKind::Firestore,
            "memory" => StoreKind::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store,
            results_base_url: env::var("RESULTS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://www.swimmingresults.org".to_string()),
            min_request_interval: Duration::from_millis(parse_number(
                "MIN_REQUEST_INTERVAL_MS",
                2000,
            )?),
            request_timeout: Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", 10)?),
            user_agents_file: env::var("USER_AGENTS_FILE").ok().map(PathBuf::from),
            cache_ttl: Duration::from_secs(parse_number("CACHE_TTL_HOURS", 24)? * 3600),
        })
    }
}

fn parse_number(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
