use std::time::Duration;
use thiserror::Error;

/// A single model call that did not produce usable text.
///
/// None of these are fatal: the field being resolved stays as it was, and the
/// failure is not cached, so the next run asks again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model '{model}' timed out after {after:?}")]
    Timeout { model: String, after: Duration },

    #[error("model '{model}' invocation failed: {reason}")]
    Invocation { model: String, reason: String },

    #[error("model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    #[error("model '{model}' returned malformed output: {reason}")]
    MalformedOutput { model: String, reason: String },
}

impl ModelError {
    pub fn invocation(model: impl Into<String>, reason: impl ToString) -> Self {
        ModelError::Invocation {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(model: impl Into<String>, reason: impl ToString) -> Self {
        ModelError::MalformedOutput {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}
