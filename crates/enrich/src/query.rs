use cache::{CacheKind, SourceCache};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::ModelError;
use crate::llm::ModelRuntime;

/// Cached model queries for one model.
///
/// The cache key is purely `model_id:prompt`, so asking the same thing twice,
/// in this run or a later one, only invokes the model once.
#[derive(Clone)]
pub struct ModelQuery {
    runtime: Arc<dyn ModelRuntime>,
    model_id: String,
    timeout: Duration,
    cache: SourceCache,
}

impl ModelQuery {
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        model_id: impl Into<String>,
        timeout: Duration,
        cache: SourceCache,
    ) -> Self {
        Self {
            runtime,
            model_id: model_id.into(),
            timeout,
            cache,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn key_material(&self, prompt: &str) -> String {
        format!("{}:{}", self.model_id, prompt)
    }

    pub async fn ask(&self, prompt: &str) -> Result<String, ModelError> {
        self.ask_with(prompt, Ok).await
    }

    /// Ask and parse. `parse` runs before anything is cached, so a response
    /// that fails to parse is treated like any other failure.
    pub async fn ask_with<T, P>(&self, prompt: &str, parse: P) -> Result<T, ModelError>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce(String) -> Result<T, ModelError>,
    {
        let material = self.key_material(prompt);
        let runtime = self.runtime.as_ref();
        let model = self.model_id.as_str();
        let timeout = self.timeout;

        self.cache
            .get_or_compute(CacheKind::ModelQuery, &material, move || async move {
                info!(model = model, prompt = prompt, "Running model");
                let text = runtime.invoke(model, prompt, timeout).await?;
                parse(text)
            })
            .await
    }
}
