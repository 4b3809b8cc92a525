use std::env;
use std::time::Duration;
use thiserror::Error;

/// Controls how much detail internal errors expose in the response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsMode {
    /// Raw error message and trace are attached to 500 responses
    Development,
    /// 500 responses carry an opaque constant instead of error details
    #[default]
    Production,
}

impl DiagnosticsMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => DiagnosticsMode::Development,
            _ => DiagnosticsMode::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, DiagnosticsMode::Development)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set; refusing to start without an upstream credential")]
    MissingApiKey,
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream credential (required)
    pub api_key: String,

    /// Upstream model identifier (default: "gemini-1.5-flash")
    pub model: String,

    /// Upstream API base URL
    pub api_base: String,

    /// Error detail exposure (default: Production)
    pub diagnostics: DiagnosticsMode,

    /// Listening port (default: 3000)
    pub port: u16,

    /// Path prefix for every API route (default: "/api")
    pub api_prefix: String,

    /// Requests allowed per client per window (default: 100)
    pub rate_limit_max_requests: u32,

    /// Rate limit window (default: 15 minutes)
    pub rate_limit_window: Duration,

    /// How often expired rate-limit entries are swept (default: 60s)
    pub rate_limit_sweep_interval: Duration,

    /// Trust X-Forwarded-For / X-Real-IP for the client key (default: false)
    pub trust_proxy: bool,

    /// Sniff uploaded bytes and reject content outside the category allow-list (default: false)
    pub verify_file_signatures: bool,

    /// Upstream request timeout (default: 120s)
    pub upstream_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            diagnostics: DiagnosticsMode::Production,
            port: 3000,
            api_prefix: "/api".to_string(),
            rate_limit_max_requests: 100,
            rate_limit_window: Duration::from_millis(15 * 60 * 1000),
            rate_limit_sweep_interval: Duration::from_secs(60),
            trust_proxy: false,
            verify_file_signatures: false,
            upstream_timeout: Duration::from_secs(120),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let api_key = lookup("GEMINI_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let flag = |key: &str, fallback: bool| {
            lookup(key)
                .map(|v| {
                    let v = v.trim().to_lowercase();
                    v == "true" || v == "1" || v == "yes"
                })
                .unwrap_or(fallback)
        };

        Ok(Self {
            api_key,

            model: lookup("GEMINI_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.model),

            api_base: lookup("GEMINI_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default.api_base),

            diagnostics: lookup("APP_ENV")
                .map(|v| DiagnosticsMode::parse(&v))
                .unwrap_or(default.diagnostics),

            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            api_prefix: lookup("API_PREFIX")
                .map(|v| normalize_prefix(&v))
                .unwrap_or(default.api_prefix),

            rate_limit_max_requests: lookup("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default.rate_limit_max_requests),

            rate_limit_window: lookup("RATE_LIMIT_WINDOW_MS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_millis)
                .unwrap_or(default.rate_limit_window),

            rate_limit_sweep_interval: lookup("RATE_LIMIT_SWEEP_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.rate_limit_sweep_interval),

            trust_proxy: flag("TRUST_PROXY", default.trust_proxy),

            verify_file_signatures: flag(
                "VERIFY_FILE_SIGNATURES",
                default.verify_file_signatures,
            ),

            upstream_timeout: lookup("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.upstream_timeout),
        })
    }

    /// Create config for development (error details exposed, relaxed limits)
    pub fn development() -> Self {
        Self {
            api_key: "development-key".to_string(),
            diagnostics: DiagnosticsMode::Development,
            rate_limit_max_requests: 1000,
            ..Self::default()
        }
    }

    /// Create config for production (opaque errors, default limits)
    pub fn production() -> Self {
        Self {
            api_key: "production-key".to_string(),
            diagnostics: DiagnosticsMode::Production,
            ..Self::default()
        }
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
