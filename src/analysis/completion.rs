//! Remote completion service boundary
//!
//! Text in, text out, or a failure value. Nothing here panics or retries;
//! the pipeline decides what a failure means.

use super::context::AnalysisContext;
use crate::config::CompletionConfig;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A single-prompt, single-answer completion backend.
pub trait CompletionService: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct HttpCompletionService {
    client: reqwest::Client,
    config: CompletionConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl HttpCompletionService {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ServiceUnavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

impl CompletionService for HttpCompletionService {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": self.config.system_prompt},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::ServiceUnavailable("quota exceeded".to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::ServiceUnavailable(format!("HTTP {status}: {error_text}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("response has no message content".to_string()))
    }
}

/// The backend selected from configuration: HTTP when an API key is set,
/// otherwise a backend that always reports the service as unavailable.
#[derive(Debug, Clone)]
pub enum CompletionBackend {
    Http(HttpCompletionService),
    Offline,
}

impl CompletionBackend {
    pub fn from_config(config: CompletionConfig) -> Self {
        if !config.is_configured() {
            tracing::warn!("OPENAI_API_KEY not set; analyses will use fallback verdicts");
            return CompletionBackend::Offline;
        }
        match HttpCompletionService::new(config) {
            Ok(service) => CompletionBackend::Http(service),
            Err(e) => {
                tracing::warn!(error = %e, "completion client unavailable; using fallback verdicts");
                CompletionBackend::Offline
            }
        }
    }
}

impl CompletionService for CompletionBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            CompletionBackend::Http(service) => service.complete(prompt).await,
            CompletionBackend::Offline => Err(Error::ServiceUnavailable(
                "no completion API key configured".to_string(),
            )),
        }
    }
}

/// Pipeline stage: send the context's prompt, bounded by `timeout`. The
/// context rides along so the next stage can use it.
pub async fn invoke_completion_service<C: CompletionService>(
    service: &C,
    context: AnalysisContext,
    timeout: Duration,
) -> Result<(AnalysisContext, String)> {
    debug!(prompt_len = context.prompt().len(), "calling completion service");
    match tokio::time::timeout(timeout, service.complete(context.prompt())).await {
        Ok(Ok(text)) => Ok((context, text)),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(Error::ServiceTimeout(timeout)),
    }
}
