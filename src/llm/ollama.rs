//! Ollama client for local inference.
//!
//! Wraps the `ollama` CLI: the prompt is piped through stdin into
//! `ollama run <model>` and stdout is the response. Every call is bounded by
//! a wall-clock timeout so an unresponsive daemon can never hang a session.

use crate::llm::{ModelClient, ModelError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Ollama-backed model client.
///
/// # Example
///
/// ```rust,ignore
/// use localmind::llm::{ModelClient, OllamaClient};
///
/// let client = OllamaClient::new("qwen-lite").with_timeout(60);
/// if client.check_availability().await {
///     let text = client.query("hello").await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Model name as known to Ollama.
    model: String,
    /// Request timeout in seconds.
    timeout_secs: u64,
}

impl OllamaClient {
    /// Default request timeout (2 minutes for local inference).
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Create a client for the given model with the default timeout.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check whether the ollama CLI exists and the configured model is
    /// pulled.
    ///
    /// Probes with `ollama list` under a short timeout; any failure reads as
    /// "not available" rather than an error.
    pub async fn check_availability(&self) -> bool {
        if which::which("ollama").is_err() {
            return false;
        }

        let output = match tokio::time::timeout(
            Duration::from_secs(5),
            AsyncCommand::new("ollama").arg("list").output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Failed to run 'ollama list': {}", e);
                return false;
            }
            Err(_) => {
                debug!("'ollama list' timed out - daemon may be unresponsive");
                return false;
            }
        };

        if !output.status.success() {
            return false;
        }

        // Output: NAME  ID  SIZE  MODIFIED, one model per line after header.
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.lines().skip(1).any(|line| {
            line.split_whitespace().next().is_some_and(|name| {
                name.starts_with(&self.model) || name.split(':').next() == Some(&self.model)
            })
        })
    }

    async fn execute_prompt(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(
            "Running ollama {} ({} chars prompt)",
            self.model,
            prompt.len()
        );

        let mut child = match AsyncCommand::new("ollama")
            .args(["run", &self.model])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelError::CliNotFound {
                    message: "the 'ollama' CLI is not installed or not in PATH".to_string(),
                });
            }
            Err(e) => {
                return Err(ModelError::Connection {
                    message: format!("failed to spawn ollama process: {e}"),
                });
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ModelError::Connection {
                    message: format!("failed to write prompt: {e}"),
                })?;
            stdin.flush().await.map_err(|e| ModelError::Connection {
                message: format!("failed to flush stdin: {e}"),
            })?;
            drop(stdin);
        }

        let output = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ModelError::Connection {
                    message: format!("failed to read output: {e}"),
                });
            }
            Err(_) => {
                // Tokio cleans up the child when it is dropped.
                return Err(ModelError::Timeout {
                    timeout_secs: self.timeout_secs,
                });
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if stderr.contains("not found") && stderr.contains("model") {
                Err(ModelError::ModelNotFound {
                    model: self.model.clone(),
                })
            } else if stderr.contains("connection refused") || stderr.contains("connect:") {
                Err(ModelError::Connection { message: stderr })
            } else {
                Err(ModelError::Process { message: stderr })
            }
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn run_prompt(&self, prompt: &str) -> Result<String, ModelError> {
        self.execute_prompt(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelClient;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("qwen-lite");
        assert_eq!(client.model_name(), "qwen-lite");
        assert_eq!(client.timeout_secs, OllamaClient::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_timeout_config() {
        let client = OllamaClient::new("qwen-lite").with_timeout(30);
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OllamaClient>();
    }

    #[test]
    fn test_client_as_trait_object() {
        let client: Box<dyn ModelClient> = Box::new(OllamaClient::new("mistral"));
        assert_eq!(client.model_name(), "mistral");
    }

    /// Exercises the availability probe against the real system; must not
    /// panic whether or not ollama is installed.
    #[tokio::test]
    async fn test_availability_probe_never_panics() {
        let client = OllamaClient::new("qwen-lite");
        let _ = client.check_availability().await;
    }
}
