//! Scripted model runtime shared by this crate's tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::ModelError;
use crate::llm::ModelRuntime;

/// Answers by prompt content and records every prompt it sees.
#[derive(Default)]
pub struct StubRuntime {
    /// Prompts containing this text time out.
    pub time_out_on: Option<&'static str>,
    /// Returned verbatim for every prompt when set.
    pub fixed_reply: Option<&'static str>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubRuntime {
    pub fn timing_out_on(needle: &'static str) -> Self {
        Self {
            time_out_on: Some(needle),
            ..Default::default()
        }
    }

    pub fn replying(reply: &'static str) -> Self {
        Self {
            fixed_reply: Some(reply),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelRuntime for StubRuntime {
    async fn invoke(
        &self,
        model_id: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.time_out_on.is_some_and(|needle| prompt.contains(needle)) {
            return Err(ModelError::Timeout {
                model: model_id.to_string(),
                after: timeout,
            });
        }

        if let Some(reply) = self.fixed_reply {
            return Ok(reply.to_string());
        }

        let reply = if prompt.contains("synonyms") {
            "sprint; dash"
        } else if prompt.contains("antonyms") {
            "walk; crawl"
        } else if prompt.contains("example sentence") {
            "She runs every morning."
        } else if prompt.contains("base form") {
            "run"
        } else {
            "To move swiftly on foot."
        };

        Ok(reply.to_string())
    }
}
