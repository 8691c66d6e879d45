//! Oracle configuration from the environment
//!
//! Precedence for every knob: explicit override (CLI flag) → env var →
//! default. A backend whose API key is absent resolves to
//! [`OracleBackend::Disabled`], which the adapter treats as "use the
//! fallback estimator". Malformed numbers are configuration errors.

use std::str::FromStr;
use std::time::Duration;

pub const BACKEND_ENV: &str = "BRAINLIFT_ORACLE_BACKEND";
pub const TIMEOUT_SECS_ENV: &str = "BRAINLIFT_ORACLE_TIMEOUT_SECS";
pub const MAX_OUTPUT_TOKENS_ENV: &str = "BRAINLIFT_ORACLE_MAX_OUTPUT_TOKENS";

pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const OPENROUTER_BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";
pub const OPENROUTER_MODEL_ENV: &str = "OPENROUTER_MODEL";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const ANTHROPIC_MODEL_ENV: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_VERSION_ENV: &str = "ANTHROPIC_VERSION";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2000;
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
pub const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-sonnet-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}={value:?} (expected a positive integer)")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
    #[error("unknown oracle backend {0:?} (expected auto, none, openrouter, openai, anthropic)")]
    UnknownBackend(String),
}

// ============================================================================
// Backend selection
// ============================================================================

/// The backend the user asked for, before keys are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// First backend whose API key is present: OpenRouter, OpenAI, Anthropic.
    #[default]
    Auto,
    None,
    OpenRouter,
    OpenAi,
    Anthropic,
}

impl FromStr for BackendChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(BackendChoice::Auto),
            "none" | "off" | "fallback" => Ok(BackendChoice::None),
            "openrouter" => Ok(BackendChoice::OpenRouter),
            "openai" => Ok(BackendChoice::OpenAi),
            "anthropic" => Ok(BackendChoice::Anthropic),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoint {
    pub api_key: String,
    /// Without a trailing `/` or `/v1`.
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicEndpoint {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleBackend {
    Disabled,
    OpenRouter(HttpEndpoint),
    OpenAi(HttpEndpoint),
    Anthropic(AnthropicEndpoint),
}

impl OracleBackend {
    pub fn name(&self) -> &'static str {
        match self {
            OracleBackend::Disabled => "none",
            OracleBackend::OpenRouter(_) => "openrouter",
            OracleBackend::OpenAi(_) => "openai",
            OracleBackend::Anthropic(_) => "anthropic",
        }
    }
}

/// Values given on the command line; `None` defers to the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<BackendChoice>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub timeout: Duration,
    pub max_output_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Disabled,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl OracleConfig {
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok(), overrides)
    }

    /// Resolve against an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let choice = match overrides.backend {
            Some(choice) => choice,
            None => match get(BACKEND_ENV) {
                Some(v) => v.parse()?,
                None => BackendChoice::Auto,
            },
        };

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => parse_number(TIMEOUT_SECS_ENV, get(TIMEOUT_SECS_ENV), DEFAULT_TIMEOUT_SECS)?,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Zero {
                var: TIMEOUT_SECS_ENV,
            });
        }

        let max_output_tokens = parse_number(
            MAX_OUTPUT_TOKENS_ENV,
            get(MAX_OUTPUT_TOKENS_ENV),
            u64::from(DEFAULT_MAX_OUTPUT_TOKENS),
        )?;
        let max_output_tokens = u32::try_from(max_output_tokens).map_err(|_| {
            ConfigError::InvalidNumber {
                var: MAX_OUTPUT_TOKENS_ENV,
                value: max_output_tokens.to_string(),
            }
        })?;
        if max_output_tokens == 0 {
            return Err(ConfigError::Zero {
                var: MAX_OUTPUT_TOKENS_ENV,
            });
        }

        let openrouter = || {
            get(OPENROUTER_API_KEY_ENV).map(|api_key| {
                OracleBackend::OpenRouter(HttpEndpoint {
                    api_key,
                    base_url: normalize_base_url(
                        get(OPENROUTER_BASE_URL_ENV).as_deref(),
                        DEFAULT_OPENROUTER_BASE_URL,
                    ),
                    model: get(OPENROUTER_MODEL_ENV)
                        .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                })
            })
        };
        let openai = || {
            get(OPENAI_API_KEY_ENV).map(|api_key| {
                OracleBackend::OpenAi(HttpEndpoint {
                    api_key,
                    base_url: normalize_base_url(
                        get(OPENAI_BASE_URL_ENV).as_deref(),
                        DEFAULT_OPENAI_BASE_URL,
                    ),
                    model: get(OPENAI_MODEL_ENV).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                })
            })
        };
        let anthropic = || {
            get(ANTHROPIC_API_KEY_ENV).map(|api_key| {
                OracleBackend::Anthropic(AnthropicEndpoint {
                    api_key,
                    base_url: normalize_base_url(
                        get(ANTHROPIC_BASE_URL_ENV).as_deref(),
                        DEFAULT_ANTHROPIC_BASE_URL,
                    ),
                    model: get(ANTHROPIC_MODEL_ENV)
                        .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                    version: get(ANTHROPIC_VERSION_ENV)
                        .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
                })
            })
        };

        let resolved = match choice {
            BackendChoice::None => Some(OracleBackend::Disabled),
            BackendChoice::Auto => openrouter().or_else(openai).or_else(anthropic),
            BackendChoice::OpenRouter => openrouter(),
            BackendChoice::OpenAi => openai(),
            BackendChoice::Anthropic => anthropic(),
        };
        let backend = match resolved {
            Some(backend) => backend,
            None => {
                if choice != BackendChoice::Auto {
                    tracing::warn!(
                        ?choice,
                        "oracle backend selected but its API key is not set; using fallback scores"
                    );
                }
                OracleBackend::Disabled
            }
        };

        Ok(Self {
            backend,
            timeout: Duration::from_secs(timeout_secs),
            max_output_tokens,
        })
    }
}

fn parse_number(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

/// Trim trailing `/` and a trailing `/v1`; paths are appended per request.
pub fn normalize_base_url(raw: Option<&str>, default: &str) -> String {
    let base = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(default);
    let base = base.trim_end_matches('/');
    base.strip_suffix("/v1").unwrap_or(base).to_string()
}
