use anyhow::{Context, Result};
use lexicon::SenseEntry;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 2] = ["column_a", "column_b"];

/// Front of the card: the word, its pronunciation, and usage.
pub fn column_a(entry: &SenseEntry) -> String {
    format!(
        "{} {}\nExamples: {}",
        entry.word, entry.phonetic, entry.examples
    )
}

/// Back of the card: the meaning and related words.
pub fn column_b(entry: &SenseEntry) -> String {
    format!(
        "Part of Speech: {}\nDefinition: {}\nSynonyms: {}\nAntonyms: {}",
        entry.part_of_speech, entry.definitions, entry.synonyms, entry.antonyms
    )
}

/// Writes entries as a two-column CSV, one row per entry.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of rows written, header excluded.
    pub fn write(&self, entries: &[SenseEntry]) -> Result<usize> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create output file: {}", self.path.display()))?;

        write_rows(file, entries)
            .with_context(|| format!("Failed to write output file: {}", self.path.display()))
    }
}

pub fn write_rows<W: Write>(writer: W, entries: &[SenseEntry]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(HEADER)?;
    for entry in entries {
        writer.write_record([column_a(entry), column_b(entry)])?;
    }
    writer.flush()?;

    Ok(entries.len())
}
