use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Development-only signing secret used when JWT_SECRET is absent.
/// Anything signed with it is forgeable; `from_env` logs a warning
/// whenever this fallback is active.
pub const DEV_JWT_SECRET: &str = "callsight-dev-secret-change-me";

const GEMINI_DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
    /// Upper bound on any single credential-store operation.
    pub store_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set; using insecure development default");
                DEV_JWT_SECRET.into()
            }),
        };
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_DEFAULT_MODEL.into()),
            endpoint: std::env::var("GEMINI_ENDPOINT")
                .unwrap_or_else(|_| GEMINI_DEFAULT_ENDPOINT.into()),
        };
        let store_timeout = Duration::from_millis(
            std::env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5_000),
        );
        Ok(Self {
            database_url,
            jwt,
            gemini,
            store_timeout,
        })
    }
}
