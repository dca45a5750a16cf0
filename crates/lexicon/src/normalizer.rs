use crate::schema::{Meaning, RawLexicalRecord, SenseEntry};

/// Joins list-valued fields into a single string.
pub const ITEM_SEPARATOR: &str = "; ";

/// Expands a dictionary record into one `SenseEntry` per retained meaning.
///
/// Pure and deterministic: same record and limits, same output.
#[derive(Debug, Clone, Copy)]
pub struct EntryNormalizer {
    max_senses: usize,
    max_items: usize,
}

impl Default for EntryNormalizer {
    fn default() -> Self {
        Self::new(2, 2)
    }
}

impl EntryNormalizer {
    pub fn new(max_senses: usize, max_items: usize) -> Self {
        Self {
            max_senses,
            max_items,
        }
    }

    pub fn normalize(&self, record: &RawLexicalRecord) -> Vec<SenseEntry> {
        let phonetic = self.resolve_phonetic(record);

        // Later senses are dropped, not merged
        record
            .meanings
            .iter()
            .take(self.max_senses)
            .map(|meaning| self.sense_entry(&record.word, &phonetic, meaning))
            .collect()
    }

    /// Top-level phonetic first; providers often only fill the per-dialect list.
    fn resolve_phonetic(&self, record: &RawLexicalRecord) -> String {
        if let Some(phonetic) = record.phonetic.as_deref().filter(|p| !p.trim().is_empty()) {
            return phonetic.to_string();
        }

        join_items(
            record
                .phonetics
                .iter()
                .filter_map(|p| p.text.as_deref())
                .filter(|t| !t.trim().is_empty())
                .take(self.max_items),
        )
    }

    fn sense_entry(&self, word: &str, phonetic: &str, meaning: &Meaning) -> SenseEntry {
        let window = &meaning.definitions[..self.max_items.min(meaning.definitions.len())];

        let definitions = join_items(window.iter().map(|d| d.definition.as_str()));

        // Only examples attached to the retained definitions
        let examples = join_items(
            window
                .iter()
                .filter_map(|d| d.example.as_deref())
                .filter(|e| !e.trim().is_empty()),
        );

        SenseEntry {
            word: word.to_string(),
            phonetic: phonetic.to_string(),
            part_of_speech: meaning.part_of_speech.clone(),
            definitions,
            examples,
            synonyms: join_items(meaning.synonyms.iter().take(self.max_items).map(String::as_str)),
            antonyms: join_items(meaning.antonyms.iter().take(self.max_items).map(String::as_str)),
        }
    }
}

fn join_items<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(ITEM_SEPARATOR)
}
