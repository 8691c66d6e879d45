//! Ranking oracle implementations
//!
//! HTTP backends are compiled in behind the `openai` (chat completions,
//! which also covers OpenRouter) and `anthropic` features. `ScriptedOracle`
//! is always available for tests and offline runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{OracleBackend, OracleConfig};
use crate::{OracleError, OracleRequest, RankingOracle};

#[cfg(any(feature = "openai", feature = "anthropic"))]
use crate::prompt::SYSTEM_PROMPT;

/// Sampling temperature for every HTTP backend.
pub const ORACLE_TEMPERATURE: f64 = 0.1;

// ============================================================================
// Chat Completions (OpenRouter / OpenAI)
// ============================================================================

#[cfg(feature = "openai")]
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    label: &'static str,
    endpoint: crate::config::HttpEndpoint,
    max_output_tokens: u32,
}

#[cfg(feature = "openai")]
impl ChatCompletionsOracle {
    pub fn new(
        label: &'static str,
        endpoint: crate::config::HttpEndpoint,
        timeout: Duration,
        max_output_tokens: u32,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            label,
            endpoint,
            max_output_tokens,
        })
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl RankingOracle for ChatCompletionsOracle {
    async fn rank(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let url = format!("{}/v1/chat/completions", self.endpoint.base_url);
        let body = serde_json::json!({
            "model": self.endpoint.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": request.user_prompt()},
            ],
            "temperature": ORACLE_TEMPERATURE,
            "max_tokens": self.max_output_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OracleError::InvalidResponse("missing choices[0].message.content".into()))
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.label, self.endpoint.model)
    }
}

// ============================================================================
// Anthropic Messages
// ============================================================================

#[cfg(feature = "anthropic")]
pub struct AnthropicOracle {
    client: reqwest::Client,
    endpoint: crate::config::AnthropicEndpoint,
    max_output_tokens: u32,
}

#[cfg(feature = "anthropic")]
impl AnthropicOracle {
    pub fn new(
        endpoint: crate::config::AnthropicEndpoint,
        timeout: Duration,
        max_output_tokens: u32,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            max_output_tokens,
        })
    }
}

/// Concatenate the `text` blocks of a Messages API reply.
#[cfg(feature = "anthropic")]
fn anthropic_output_text(v: &serde_json::Value) -> Option<String> {
    let blocks = v.get("content")?.as_array()?;
    let text: String = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(feature = "anthropic")]
#[async_trait]
impl RankingOracle for AnthropicOracle {
    async fn rank(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let url = format!("{}/v1/messages", self.endpoint.base_url);
        let body = serde_json::json!({
            "model": self.endpoint.model,
            "system": SYSTEM_PROMPT,
            "messages": [{"role": "user", "content": request.user_prompt()}],
            "temperature": ORACLE_TEMPERATURE,
            "max_tokens": self.max_output_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.endpoint.api_key)
            .header("anthropic-version", &self.endpoint.version)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("failed to reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        anthropic_output_text(&data)
            .ok_or_else(|| OracleError::InvalidResponse("no text content in reply".into()))
    }

    fn describe(&self) -> String {
        format!("anthropic:{}", self.endpoint.model)
    }
}

// ============================================================================
// Scripted oracle
// ============================================================================

/// One canned answer.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
    /// Sleep, then answer with the text.
    Delay(Duration, String),
}

/// Replays canned replies in order, repeating the last one once exhausted.
pub struct ScriptedOracle {
    replies: Mutex<Vec<ScriptedReply>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Text(reply.into())])
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![ScriptedReply::Fail(message.into())])
    }

    /// Number of `rank` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `rank` calls observed.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, index: usize) -> Option<ScriptedReply> {
        let replies = self.replies.lock();
        replies.get(index).or_else(|| replies.last()).cloned()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RankingOracle for ScriptedOracle {
    async fn rank(&self, _request: &OracleRequest) -> Result<String, OracleError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match self.next_reply(index) {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(OracleError::Unavailable(message)),
            Some(ScriptedReply::Delay(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => Err(OracleError::Unavailable("no scripted replies".to_string())),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

// ============================================================================
// Construction from configuration
// ============================================================================

/// Instantiate the configured backend, or `None` when the oracle is disabled
/// or its backend was not compiled in.
pub fn build_oracle(config: &OracleConfig) -> Option<Arc<dyn RankingOracle>> {
    let built: Result<Arc<dyn RankingOracle>, OracleError> = match &config.backend {
        OracleBackend::Disabled => return None,
        #[cfg(feature = "openai")]
        OracleBackend::OpenRouter(endpoint) => ChatCompletionsOracle::new(
            "openrouter",
            endpoint.clone(),
            config.timeout,
            config.max_output_tokens,
        )
        .map(|o| Arc::new(o) as Arc<dyn RankingOracle>),
        #[cfg(feature = "openai")]
        OracleBackend::OpenAi(endpoint) => ChatCompletionsOracle::new(
            "openai",
            endpoint.clone(),
            config.timeout,
            config.max_output_tokens,
        )
        .map(|o| Arc::new(o) as Arc<dyn RankingOracle>),
        #[cfg(feature = "anthropic")]
        OracleBackend::Anthropic(endpoint) => {
            AnthropicOracle::new(endpoint.clone(), config.timeout, config.max_output_tokens)
                .map(|o| Arc::new(o) as Arc<dyn RankingOracle>)
        }
        #[allow(unreachable_patterns)]
        other => Err(OracleError::Unavailable(format!(
            "backend {} is not compiled in (enable the matching cargo feature)",
            other.name()
        ))),
    };

    match built {
        Ok(oracle) => {
            tracing::info!(oracle = %oracle.describe(), "ranking oracle configured");
            Some(oracle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "ranking oracle unavailable; using fallback scores");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OracleRequest {
        OracleRequest {
            evidence_table: String::new(),
            title: String::new(),
            description: String::new(),
            max_citations: 1,
        }
    }

    #[tokio::test]
    async fn scripted_replays_in_order_then_repeats_last() {
        let oracle = ScriptedOracle::new(vec![
            ScriptedReply::Fail("down".into()),
            ScriptedReply::Text("[]".into()),
        ]);
        assert!(oracle.rank(&request()).await.is_err());
        assert_eq!(oracle.rank(&request()).await.unwrap(), "[]");
        assert_eq!(oracle.rank(&request()).await.unwrap(), "[]");
        assert_eq!(oracle.calls(), 3);
        assert_eq!(oracle.max_concurrent_calls(), 1);
    }

    #[tokio::test]
    async fn empty_script_is_unavailable() {
        let oracle = ScriptedOracle::new(Vec::new());
        assert!(matches!(
            oracle.rank(&request()).await,
            Err(OracleError::Unavailable(_))
        ));
    }

    #[test]
    fn disabled_config_builds_nothing() {
        assert!(build_oracle(&OracleConfig::default()).is_none());
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn anthropic_text_blocks_are_joined() {
        let v = serde_json::json!({
            "content": [
                {"type": "text", "text": "[{\"name\": "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "\"A\"}]"}
            ]
        });
        assert_eq!(anthropic_output_text(&v).as_deref(), Some("[{\"name\": \"A\"}]"));
    }
}
