use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical dictionary record for one word.
///
/// Field names follow the provider's camelCase JSON so a provider entry
/// deserializes straight into this shape; anything not listed here (license,
/// source URLs, audio links) is dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLexicalRecord {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

impl RawLexicalRecord {
    /// A record without meanings carries nothing usable.
    pub fn has_meanings(&self) -> bool {
        !self.meanings.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phonetic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// The four fields a model may fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Definitions,
    Examples,
    Synonyms,
    Antonyms,
}

impl Field {
    /// Fixed resolution order.
    pub const BACKFILLABLE: [Field; 4] = [
        Field::Definitions,
        Field::Examples,
        Field::Synonyms,
        Field::Antonyms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Definitions => "definitions",
            Field::Examples => "examples",
            Field::Synonyms => "synonyms",
            Field::Antonyms => "antonyms",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part-of-speech block of a word, flattened to plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseEntry {
    pub word: String,
    pub phonetic: String,
    pub part_of_speech: String,
    pub definitions: String,
    pub examples: String,
    pub synonyms: String,
    pub antonyms: String,
}

impl SenseEntry {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Definitions => &self.definitions,
            Field::Examples => &self.examples,
            Field::Synonyms => &self.synonyms,
            Field::Antonyms => &self.antonyms,
        }
    }

    pub fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Definitions => self.definitions = value,
            Field::Examples => self.examples = value,
            Field::Synonyms => self.synonyms = value,
            Field::Antonyms => self.antonyms = value,
        }
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::BACKFILLABLE
            .into_iter()
            .filter(|f| self.field(*f).is_empty())
            .collect()
    }
}
