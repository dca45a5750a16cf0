use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::ModelError;

/// Reasoning models print their chain of thought before this line.
pub const THINKING_MARKER: &str = "...done thinking.";

/// Narrow capability: prompt in, text out, within `timeout`.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ModelError>;
}

/// Keep only what follows the last thinking marker, trimmed.
pub fn clean_output(raw: &str) -> String {
    raw.rsplit(THINKING_MARKER).next().unwrap_or(raw).trim().to_string()
}

fn non_empty(model_id: &str, raw: &str) -> Result<String, ModelError> {
    let text = clean_output(raw);
    if text.is_empty() {
        return Err(ModelError::EmptyResponse {
            model: model_id.to_string(),
        });
    }
    Ok(text)
}

/// Runs `<program> run <model> <prompt>` as a local process.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
}

impl OllamaCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for OllamaCli {
    fn default() -> Self {
        Self::new("ollama")
    }
}

#[async_trait]
impl ModelRuntime for OllamaCli {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ModelError> {
        let child = Command::new(&self.program)
            .arg("run")
            .arg(model_id)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ModelError::invocation(model_id, e))?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ModelError::Timeout {
                model: model_id.to_string(),
                after: timeout,
            })?
            .map_err(|e| ModelError::invocation(model_id, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModelError::invocation(
                model_id,
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }

        debug!(model = model_id, bytes = output.stdout.len(), "Model process finished");
        non_empty(model_id, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Talks to an Ollama server's generate endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new("http://localhost:11434".to_string())
    }
}

#[async_trait]
impl ModelRuntime for OllamaClient {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: model_id,
            prompt,
            stream: false,
        };

        let to_error = |e: reqwest::Error| {
            if e.is_timeout() {
                ModelError::Timeout {
                    model: model_id.to_string(),
                    after: timeout,
                }
            } else {
                ModelError::invocation(model_id, e)
            }
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(to_error)?;

        if !response.status().is_success() {
            return Err(ModelError::invocation(
                model_id,
                format!("Ollama request failed: {}", response.status()),
            ));
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(to_error)?;

        non_empty(model_id, &ollama_response.response)
    }
}
