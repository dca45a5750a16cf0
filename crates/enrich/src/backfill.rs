use lexicon::{Field, SenseEntry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::prompt::{field_prompt, structured_prompt};
use crate::query::ModelQuery;

/// Which fields a model is allowed to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Only fields the dictionary left empty.
    #[default]
    FillEmpty,
    /// Every backfillable field; a failed call keeps the dictionary value.
    Overwrite,
}

/// How the model is asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillMode {
    /// One prompt per field.
    #[default]
    PerField,
    /// One JSON-producing prompt per entry.
    Structured,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub filled: usize,
    pub failed: usize,
}

impl BackfillReport {
    pub fn merge(&mut self, other: BackfillReport) {
        self.filled += other.filled;
        self.failed += other.failed;
    }
}

/// Shape the structured prompt asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFields {
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub word_type: String,
    #[serde(default)]
    pub definitions: String,
    #[serde(default)]
    pub examples: String,
    #[serde(default)]
    pub synonyms: String,
    #[serde(default)]
    pub antonyms: String,
}

impl StructuredFields {
    fn get(&self, field: Field) -> &str {
        match field {
            Field::Definitions => &self.definitions,
            Field::Examples => &self.examples,
            Field::Synonyms => &self.synonyms,
            Field::Antonyms => &self.antonyms,
        }
    }

    /// Tolerates prose or code fences around the object.
    pub fn parse(model: &str, text: &str) -> Result<Self, ModelError> {
        let start = text.find('{');
        let end = text.rfind('}');

        let json = match (start, end) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => return Err(ModelError::malformed(model, "no JSON object in response")),
        };

        serde_json::from_str(json).map_err(|e| ModelError::malformed(model, e))
    }
}

/// Fills backfillable fields of sense entries from a model.
///
/// Never fails as a whole: a failed call leaves its field as it was.
#[derive(Clone)]
pub struct FieldResolver {
    query: ModelQuery,
    policy: MergePolicy,
    mode: BackfillMode,
}

impl FieldResolver {
    pub fn new(query: ModelQuery) -> Self {
        Self {
            query,
            policy: MergePolicy::default(),
            mode: BackfillMode::default(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: BackfillMode) -> Self {
        self.mode = mode;
        self
    }

    pub async fn backfill(&self, word: &str, mut entries: Vec<SenseEntry>) -> Vec<SenseEntry> {
        for entry in &mut entries {
            self.backfill_entry(word, entry).await;
        }
        entries
    }

    pub async fn backfill_entry(&self, word: &str, entry: &mut SenseEntry) -> BackfillReport {
        let targets = self.targets(entry);
        if targets.is_empty() {
            return BackfillReport::default();
        }

        match self.mode {
            BackfillMode::PerField => self.per_field(word, entry, &targets).await,
            BackfillMode::Structured => self.structured(word, entry, &targets).await,
        }
    }

    fn targets(&self, entry: &SenseEntry) -> Vec<Field> {
        match self.policy {
            MergePolicy::FillEmpty => entry.missing_fields(),
            MergePolicy::Overwrite => Field::BACKFILLABLE.to_vec(),
        }
    }

    async fn per_field(
        &self,
        word: &str,
        entry: &mut SenseEntry,
        targets: &[Field],
    ) -> BackfillReport {
        let mut report = BackfillReport::default();

        for &field in targets {
            let prompt = field_prompt(field, word, &entry.part_of_speech);

            match self.query.ask(&prompt).await {
                Ok(text) => {
                    debug!(word = word, field = %field, "Backfilled field");
                    entry.set_field(field, text);
                    report.filled += 1;
                }
                Err(e) => {
                    warn!(word = word, field = %field, error = %e, "Backfill failed, leaving field as is");
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn structured(
        &self,
        word: &str,
        entry: &mut SenseEntry,
        targets: &[Field],
    ) -> BackfillReport {
        let entry_json = match serde_json::to_string_pretty(&*entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(word = word, error = %e, "Could not render entry for structured prompt");
                return BackfillReport {
                    filled: 0,
                    failed: targets.len(),
                };
            }
        };

        let prompt = structured_prompt(word, &entry_json);
        let model = self.query.model_id().to_string();

        // The raw reply is what gets cached; it is only cached if it parses
        let fields = match self
            .query
            .ask_with(&prompt, |text| {
                StructuredFields::parse(&model, &text).map(|_| text)
            })
            .await
            .and_then(|text| StructuredFields::parse(&model, &text))
        {
            Ok(fields) => fields,
            Err(e) => {
                warn!(word = word, error = %e, "Structured backfill failed, leaving entry as is");
                return BackfillReport {
                    filled: 0,
                    failed: targets.len(),
                };
            }
        };

        let mut report = BackfillReport::default();
        for &field in targets {
            let value = fields.get(field).trim();
            if value.is_empty() {
                report.failed += 1;
            } else {
                entry.set_field(field, value.to_string());
                report.filled += 1;
            }
        }

        report
    }
}
