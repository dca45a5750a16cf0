use thiserror::Error;

/// Why a word produced no dictionary record. Both variants are terminal for
/// the word in the current run and neither is ever cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("word '{word}' not found")]
    NotFound { word: String },

    #[error("lookup of '{word}' failed: {reason}")]
    Transport { word: String, reason: String },
}

impl LookupError {
    pub fn not_found(word: impl Into<String>) -> Self {
        LookupError::NotFound { word: word.into() }
    }

    pub fn transport(word: impl Into<String>, reason: impl ToString) -> Self {
        LookupError::Transport {
            word: word.into(),
            reason: reason.to_string(),
        }
    }
}
