// src/config/mod.rs
// All tunables load from the environment, with .env support.

use once_cell::sync::Lazy;
use std::str::FromStr;

/// The one fatal configuration error: no model name means no turn starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("OPENAI_API_MODEL is not defined")]
pub struct MissingModel;

#[derive(Debug, Clone)]
pub struct VantageConfig {
    // ── Model Configuration
    pub openai_api_base: String,
    pub openai_api_key: String,
    /// Required before any turn starts; kept optional here so the server
    /// can boot and report the misconfiguration instead of panicking.
    pub openai_api_model: Option<String>,

    // ── Search API
    pub search_api_url: String,
    pub search_timeout: u64,

    // ── Turn pacing
    pub tool_card_delay_ms: u64,
    pub search_progress_interval_ms: u64,

    // ── Session
    pub session_user: Option<String>,

    // ── Server Configuration
    pub host: String,
    pub port: u16,

    // ── Logging Configuration
    pub log_level: String,
}

/// Parse an env var, falling back to the default on absence or bad input.
/// Values may carry trailing comments and whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

/// An optional env var; empty values count as unset.
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VantageConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            openai_api_base: env_var_or("OPENAI_API_BASE", "https://api.openai.com".to_string()),
            openai_api_key: env_var_or("OPENAI_API_KEY", String::new()),
            openai_api_model: env_var_opt("OPENAI_API_MODEL"),
            search_api_url: env_var_or("AI_SEARCH_API_URL", "http://localhost:8100".to_string()),
            search_timeout: env_var_or("VANTAGE_SEARCH_TIMEOUT", 30),
            tool_card_delay_ms: env_var_or("VANTAGE_TOOL_CARD_DELAY_MS", 1000),
            search_progress_interval_ms: env_var_or("VANTAGE_PROGRESS_INTERVAL_MS", 1000),
            session_user: env_var_opt("VANTAGE_SESSION_USER"),
            host: env_var_or("VANTAGE_HOST", "0.0.0.0".to_string()),
            port: env_var_or("VANTAGE_PORT", 3001),
            log_level: env_var_or("VANTAGE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get the configured model name, or the fatal configuration error.
    pub fn require_model(&self) -> Result<String, MissingModel> {
        self.openai_api_model.clone().ok_or(MissingModel)
    }

    /// Get full OpenAI API URL for a given endpoint
    pub fn openai_api_url(&self, endpoint: &str) -> String {
        format!("{}/v1/{}", self.openai_api_base.trim_end_matches('/'), endpoint)
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<VantageConfig> = Lazy::new(VantageConfig::from_env);
