//! Model client abstraction for local inference.
//!
//! This module provides a trait-based abstraction over the local model
//! runner, so the session loop and the prompt modes can be exercised in
//! tests without a live daemon.
//!
//! # Architecture
//!
//! The [`ModelClient`] trait defines the core interface. It is:
//!
//! - **Object-safe**: supports dynamic dispatch via `&dyn ModelClient`
//! - **Thread-safe**: `Send + Sync` bounds for async contexts
//! - **Non-fatal at the call site**: [`ModelClient::query`] converts every
//!   failure into an inline sentinel string, so a dead or slow model never
//!   crashes an interactive session
//!
//! # Example
//!
//! ```rust,ignore
//! use localmind::llm::{ModelClient, OllamaClient};
//!
//! let client = OllamaClient::new("qwen-lite").with_timeout(120);
//! let text = client.query("Summarize this week").await;
//! println!("{text}");
//! ```

pub mod ollama;

pub use ollama::OllamaClient;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Sentinel printed in place of a response when the model call exceeds its
/// wall-clock budget.
pub const TIMEOUT_SENTINEL: &str = "[Response timed out]";

/// Errors that can occur when invoking the local model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model runner CLI is not installed or not on PATH.
    #[error("ollama CLI not found: {message}")]
    CliNotFound { message: String },

    /// The requested model is not pulled locally.
    #[error("Model '{model}' is not installed. Run: ollama pull {model}")]
    ModelNotFound { model: String },

    /// The call exceeded its wall-clock budget.
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The runner process failed or produced unusable output.
    #[error("Model process failed: {message}")]
    Process { message: String },

    /// Spawning or talking to the runner process failed.
    #[error("Connection error: {message}")]
    Connection { message: String },
}

impl ModelError {
    /// Check if this error is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }

    /// Render this error as the inline sentinel the session prints.
    ///
    /// Timeouts get the fixed sentinel; everything else is wrapped in an
    /// `[Error: ...]` marker truncated to 100 characters.
    #[must_use]
    pub fn sentinel(&self) -> String {
        match self {
            Self::Timeout { .. } => TIMEOUT_SENTINEL.to_string(),
            other => {
                let detail: String = other.to_string().chars().take(100).collect();
                format!("[Error: {detail}]")
            }
        }
    }
}

/// Abstraction for model invocation.
///
/// Implementations wrap a concrete runner (Ollama in production, a mock in
/// tests) behind a unified prompt-in/text-out interface.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run a prompt and return the model's response text.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the runner is unavailable, the model is
    /// missing, or the call times out.
    async fn run_prompt(&self, prompt: &str) -> Result<String, ModelError>;

    /// Get the name of the model being used.
    fn model_name(&self) -> &str;

    /// Run a prompt, degrading every failure to an inline sentinel string.
    ///
    /// This is the call the interactive session uses: the returned string is
    /// always printable and the session always continues.
    async fn query(&self, prompt: &str) -> String {
        match self.run_prompt(prompt).await {
            Ok(text) => text,
            Err(e) => e.sentinel(),
        }
    }
}

/// Mock model client for testing.
///
/// Returns scripted responses in order and records every prompt it was
/// handed, so tests can assert on both sides of the exchange without a live
/// model.
///
/// # Example
///
/// ```rust,ignore
/// use localmind::llm::MockModelClient;
///
/// let client = MockModelClient::new()
///     .with_response("first analysis")
///     .with_response("second analysis");
///
/// assert_eq!(client.query("hi").await, "first analysis");
/// assert_eq!(client.call_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockModelClient {
    /// Scripted replies, consumed front to back.
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    /// Reply used once the script runs dry.
    fallback: Option<String>,
    /// Every prompt passed to `run_prompt`, in order.
    prompts: Mutex<Vec<String>>,
    /// Count of prompt calls.
    call_count: AtomicU32,
}

impl MockModelClient {
    /// Create a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted successful response.
    #[must_use]
    pub fn with_response(self, response: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
        self
    }

    /// Append a scripted timeout.
    #[must_use]
    pub fn with_timeout(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ModelError::Timeout { timeout_secs: 120 }));
        self
    }

    /// Append a scripted failure.
    #[must_use]
    pub fn with_error(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ModelError::Process {
                message: message.to_string(),
            }));
        self
    }

    /// Set the reply used after the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, response: &str) -> Self {
        self.fallback = Some(response.to_string());
        self
    }

    /// Number of times `run_prompt` was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Copy of every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn run_prompt(&self, prompt: &str) -> Result<String, ModelError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(scripted) = self.responses.lock().unwrap().pop_front() {
            return scripted;
        }
        match &self.fallback {
            Some(text) => Ok(text.clone()),
            None => Err(ModelError::Process {
                message: "mock script exhausted".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_sentinel_is_fixed_string() {
        let err = ModelError::Timeout { timeout_secs: 120 };
        assert_eq!(err.sentinel(), "[Response timed out]");
    }

    #[test]
    fn test_error_sentinel_is_truncated() {
        let err = ModelError::Process {
            message: "x".repeat(500),
        };
        let sentinel = err.sentinel();
        assert!(sentinel.starts_with("[Error: "));
        assert!(sentinel.ends_with(']'));
        // "[Error: " + 100 chars + "]"
        assert!(sentinel.chars().count() <= 109);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ModelError::Timeout { timeout_secs: 1 }.is_retryable());
        assert!(ModelError::Connection {
            message: "refused".into()
        }
        .is_retryable());
        assert!(!ModelError::ModelNotFound {
            model: "qwen-lite".into()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_mock_scripted_responses_in_order() {
        let client = MockModelClient::new()
            .with_response("one")
            .with_response("two");

        assert_eq!(client.query("a").await, "one");
        assert_eq!(client.query("b").await, "two");
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_timeout_surfaces_sentinel() {
        let client = MockModelClient::new().with_timeout();
        assert_eq!(client.query("a").await, TIMEOUT_SENTINEL);
    }

    #[tokio::test]
    async fn test_mock_fallback_after_script() {
        let client = MockModelClient::new()
            .with_response("scripted")
            .with_fallback("more");

        assert_eq!(client.query("a").await, "scripted");
        assert_eq!(client.query("b").await, "more");
        assert_eq!(client.query("c").await, "more");
    }

    #[tokio::test]
    async fn test_mock_exhausted_script_is_an_error_sentinel() {
        let client = MockModelClient::new();
        let reply = client.query("a").await;
        assert!(reply.starts_with("[Error: "));
    }

    #[test]
    fn test_mock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockModelClient>();
    }
}
