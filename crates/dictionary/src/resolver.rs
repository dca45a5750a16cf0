use cache::{CacheKind, SourceCache};
use lexicon::RawLexicalRecord;
use std::sync::Arc;
use tracing::debug;

use crate::client::LexicalLookup;
use crate::error::LookupError;

/// Lower-cased, trimmed form used for every lookup and cache key.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Resolves words to canonical records through the source cache.
#[derive(Clone)]
pub struct DictionaryResolver {
    lookup: Arc<dyn LexicalLookup>,
    cache: SourceCache,
}

impl DictionaryResolver {
    pub fn new(lookup: Arc<dyn LexicalLookup>, cache: SourceCache) -> Self {
        Self { lookup, cache }
    }

    pub async fn resolve(&self, word: &str) -> Result<RawLexicalRecord, LookupError> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Err(LookupError::not_found(word));
        }

        let lookup = self.lookup.as_ref();
        let key = word.as_str();

        let record = self
            .cache
            .get_or_compute(CacheKind::DictionaryLookup, key, move || {
                lookup.lookup(key)
            })
            .await?;

        // Only found records are ever cached, but a hand-edited entry could still be empty
        if !record.has_meanings() {
            return Err(LookupError::not_found(word));
        }

        debug!(word = %word, meanings = record.meanings.len(), "Resolved dictionary entry");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lexicon::{Definition, Meaning};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Knows a fixed set of words; can be told to fail the next N calls.
    #[derive(Default)]
    struct StubLookup {
        known: Vec<&'static str>,
        transport_failures: Mutex<usize>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LexicalLookup for StubLookup {
        async fn lookup(&self, word: &str) -> Result<RawLexicalRecord, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(word.to_string());

            {
                let mut failures = self.transport_failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(LookupError::transport(word, "connection reset"));
                }
            }

            if !self.known.contains(&word) {
                return Err(LookupError::not_found(word));
            }

            Ok(RawLexicalRecord {
                word: word.to_string(),
                phonetic: None,
                phonetics: vec![],
                meanings: vec![Meaning {
                    part_of_speech: "verb".to_string(),
                    definitions: vec![Definition {
                        definition: "To move swiftly.".to_string(),
                        example: None,
                    }],
                    synonyms: vec![],
                    antonyms: vec![],
                }],
            })
        }
    }

    fn cached_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("dictionary_lookup"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_differently_cased_input_shares_one_entry() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubLookup {
            known: vec!["run"],
            ..Default::default()
        });
        let resolver = DictionaryResolver::new(stub.clone(), SourceCache::new(dir.path()));

        let a = resolver.resolve("  Run ").await.unwrap();
        let b = resolver.resolve("RUN").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stub.seen.lock().unwrap().as_slice(), ["run"]);
        assert_eq!(cached_files(&dir), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubLookup::default());
        let resolver = DictionaryResolver::new(stub.clone(), SourceCache::new(dir.path()));

        let result = resolver.resolve("xyzzqq").await;

        assert_eq!(result, Err(LookupError::not_found("xyzzqq")));
        assert_eq!(cached_files(&dir), 0);

        // Asked again, the service is asked again
        let _ = resolver.resolve("xyzzqq").await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_retried_on_next_run() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubLookup {
            known: vec!["apparent"],
            transport_failures: Mutex::new(1),
            ..Default::default()
        });

        let first_run = DictionaryResolver::new(stub.clone(), SourceCache::new(dir.path()));
        assert!(matches!(
            first_run.resolve("apparent").await,
            Err(LookupError::Transport { .. })
        ));

        let second_run = DictionaryResolver::new(stub.clone(), SourceCache::new(dir.path()));
        let record = second_run.resolve("apparent").await.unwrap();

        assert_eq!(record.word, "apparent");
        assert_eq!(cached_files(&dir), 1);
    }

    #[tokio::test]
    async fn test_blank_word_never_reaches_the_service() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubLookup::default());
        let resolver = DictionaryResolver::new(stub.clone(), SourceCache::new(dir.path()));

        assert!(resolver.resolve("   ").await.is_err());
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }
}
