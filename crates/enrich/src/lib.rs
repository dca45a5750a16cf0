pub mod backfill;
pub mod error;
pub mod lemma;
pub mod llm;
pub mod prompt;
pub mod query;

#[cfg(test)]
mod testing;

pub use backfill::{BackfillMode, BackfillReport, FieldResolver, MergePolicy};
pub use error::ModelError;
pub use lemma::BaseFormResolver;
pub use llm::{ModelRuntime, OllamaCli, OllamaClient};
pub use query::ModelQuery;
