//! Completion service configuration

use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the remote completion service
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Chat completions endpoint
    pub api_url: String,

    /// API key (from environment). Empty means no remote analysis.
    pub api_key: String,

    /// Model to use (default: gpt-3.5-turbo)
    pub model: String,

    pub system_prompt: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Caller-visible deadline for one completion call
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        let timeout_secs = std::env::var("RESUME_MATCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_url: std::env::var("RESUME_MATCH_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("RESUME_MATCH_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            system_prompt: "You are an expert in résumé screening and recruiting. \
                            Answer with JSON only."
                .to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl CompletionConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
