use tracing::{debug, warn};

use crate::prompt::base_form_prompt;
use crate::query::ModelQuery;

/// Maps inflected input ("assailed") to its dictionary form ("assail").
#[derive(Clone)]
pub struct BaseFormResolver {
    query: ModelQuery,
}

impl BaseFormResolver {
    pub fn new(query: ModelQuery) -> Self {
        Self { query }
    }

    /// `None` when the model fails or answers with nothing usable.
    pub async fn base_form(&self, word: &str) -> Option<String> {
        match self.query.ask(&base_form_prompt(word)).await {
            Ok(answer) => {
                let base = extract_base_form(&answer);
                debug!(word = word, base = ?base, "Resolved base form");
                base
            }
            Err(e) => {
                warn!(word = word, error = %e, "Base form lookup failed");
                None
            }
        }
    }
}

/// First word of the answer, lower-cased, without surrounding punctuation.
pub fn extract_base_form(answer: &str) -> Option<String> {
    answer
        .split_whitespace()
        .next()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
}
