use anyhow::{Context, Result};
use cache::SourceCache;
use dictionary::{
    DictionaryResolver, FreeDictionaryClient, LexicalLookup, LookupError, normalize_word,
};
use enrich::{
    BackfillReport, BaseFormResolver, FieldResolver, ModelQuery, ModelRuntime, OllamaCli,
    OllamaClient,
};
use lexicon::{EntryNormalizer, SenseEntry};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, RuntimeKind};
use crate::metrics::{PipelineMetrics, TimedOperation};

/// Where a single word is in its trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    Lemmatizing,
    Resolving,
    Normalizing,
    Backfilling,
    Done,
    Skipped,
}

impl fmt::Display for WordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WordState::Lemmatizing => "lemmatizing",
            WordState::Resolving => "resolving",
            WordState::Normalizing => "normalizing",
            WordState::Backfilling => "backfilling",
            WordState::Done => "done",
            WordState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordOutcome {
    Done {
        word: String,
        entries: Vec<SenseEntry>,
    },
    Skipped {
        word: String,
        reason: LookupError,
    },
}

impl WordOutcome {
    pub fn state(&self) -> WordState {
        match self {
            WordOutcome::Done { .. } => WordState::Done,
            WordOutcome::Skipped { .. } => WordState::Skipped,
        }
    }

    pub fn entries(&self) -> &[SenseEntry] {
        match self {
            WordOutcome::Done { entries, .. } => entries,
            WordOutcome::Skipped { .. } => &[],
        }
    }
}

/// Runs each word through resolve, normalize and backfill, one word at a time.
pub struct WordPipeline {
    resolver: DictionaryResolver,
    normalizer: EntryNormalizer,
    backfiller: FieldResolver,
    base_forms: Option<BaseFormResolver>,
    metrics: Arc<PipelineMetrics>,
}

impl WordPipeline {
    pub fn new(
        resolver: DictionaryResolver,
        normalizer: EntryNormalizer,
        backfiller: FieldResolver,
    ) -> Self {
        Self {
            resolver,
            normalizer,
            backfiller,
            base_forms: None,
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn with_base_forms(mut self, base_forms: BaseFormResolver) -> Self {
        self.base_forms = Some(base_forms);
        self
    }

    /// Wires the production dictionary client and model runtime from `config`.
    pub fn from_config(config: &AppConfig, cache: SourceCache) -> Result<Self> {
        let lookup = FreeDictionaryClient::new(
            config.dictionary.url_template.clone(),
            config.dictionary.timeout(),
        )
        .context("Failed to build dictionary client")?;

        let runtime: Arc<dyn ModelRuntime> = match config.model.runtime {
            RuntimeKind::Cli => Arc::new(OllamaCli::new(config.model.program.clone())),
            RuntimeKind::Http => Arc::new(OllamaClient::new(config.model.base_url.clone())),
        };

        Ok(Self::assemble(Arc::new(lookup), runtime, config, cache))
    }

    pub fn assemble(
        lookup: Arc<dyn LexicalLookup>,
        runtime: Arc<dyn ModelRuntime>,
        config: &AppConfig,
        cache: SourceCache,
    ) -> Self {
        let query = ModelQuery::new(
            runtime,
            config.model.model_id.clone(),
            config.model.timeout(),
            cache.clone(),
        );

        let resolver = DictionaryResolver::new(lookup, cache);
        let normalizer =
            EntryNormalizer::new(config.normalize.max_senses, config.normalize.max_items);
        let backfiller = FieldResolver::new(query.clone())
            .with_policy(config.backfill.policy)
            .with_mode(config.backfill.mode);

        let pipeline = Self::new(resolver, normalizer, backfiller);
        if config.backfill.resolve_base_form {
            pipeline.with_base_forms(BaseFormResolver::new(query))
        } else {
            pipeline
        }
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Never fails: a word the dictionary cannot resolve is skipped, a field
    /// the model cannot fill is left empty.
    pub async fn process_word(&self, token: &str) -> WordOutcome {
        let timer = TimedOperation::start();
        self.metrics.record_seen();

        let mut word = normalize_word(token);

        if let Some(base_forms) = &self.base_forms {
            debug!(word = %word, state = %WordState::Lemmatizing, "Entering stage");
            if let Some(base) = base_forms.base_form(&word).await {
                if base != word {
                    info!(word = %word, base = %base, "Using base form");
                }
                word = base;
            }
        }

        debug!(word = %word, state = %WordState::Resolving, "Entering stage");
        let record = match self.resolver.resolve(&word).await {
            Ok(record) => record,
            Err(reason) => {
                warn!(word = %word, error = %reason, "Skipping word");
                self.metrics.record_skipped(timer.elapsed());
                return WordOutcome::Skipped { word, reason };
            }
        };

        debug!(word = %word, state = %WordState::Normalizing, "Entering stage");
        let mut entries = self.normalizer.normalize(&record);

        debug!(
            word = %word,
            state = %WordState::Backfilling,
            senses = entries.len(),
            "Entering stage"
        );
        let mut report = BackfillReport::default();
        for entry in entries.iter_mut() {
            report.merge(self.backfiller.backfill_entry(&word, entry).await);
        }

        self.metrics
            .record_completed(timer.elapsed(), entries.len(), report);

        info!(
            word = %word,
            senses = entries.len(),
            filled = report.filled,
            failed = report.failed,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Word done"
        );

        WordOutcome::Done { word, entries }
    }

    /// Entries of every completed word, in input order. Stops before the next
    /// word once `cancel` fires and returns what it has so far.
    pub async fn run(&self, words: &[String], cancel: &CancellationToken) -> Vec<SenseEntry> {
        let mut entries = Vec::new();

        for (i, word) in words.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    processed = i,
                    remaining = words.len() - i,
                    "Interrupted, stopping before next word"
                );
                break;
            }

            let progress = format!("{}/{}", i + 1, words.len());
            info!(word = %word, progress = %progress, "Processing word");

            if let WordOutcome::Done {
                entries: produced, ..
            } = self.process_word(word).await
            {
                entries.extend(produced);
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use enrich::{MergePolicy, ModelError};
    use lexicon::{Definition, Meaning, RawLexicalRecord};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Dictionary with "run" (no synonyms or antonyms) and "walk" (complete).
    #[derive(Default)]
    struct StubDictionary {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LexicalLookup for StubDictionary {
        async fn lookup(&self, word: &str) -> Result<RawLexicalRecord, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let (pos, definition, example, synonyms, antonyms) = match word {
                "run" => ("verb", "To move swiftly.", Some("He ran away."), vec![], vec![]),
                "walk" => (
                    "verb",
                    "To move on foot.",
                    Some("We walk to work."),
                    vec!["stroll".to_string()],
                    vec!["run".to_string()],
                ),
                _ => return Err(LookupError::not_found(word)),
            };

            Ok(RawLexicalRecord {
                word: word.to_string(),
                phonetic: Some(format!("/{}/", word)),
                phonetics: vec![],
                meanings: vec![Meaning {
                    part_of_speech: pos.to_string(),
                    definitions: vec![Definition {
                        definition: definition.to_string(),
                        example: example.map(str::to_string),
                    }],
                    synonyms,
                    antonyms,
                }],
            })
        }
    }

    /// Answers per-field prompts; prompts containing `time_out_on` time out.
    #[derive(Default)]
    struct StubModel {
        time_out_on: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModelRuntime for StubModel {
        async fn invoke(
            &self,
            model_id: &str,
            prompt: &str,
            timeout: Duration,
        ) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            if self.time_out_on.is_some_and(|needle| prompt.contains(needle)) {
                return Err(ModelError::Timeout {
                    model: model_id.to_string(),
                    after: timeout,
                });
            }

            let reply = if prompt.contains("synonyms") {
                "sprint; dash"
            } else if prompt.contains("antonyms") {
                "walk; crawl"
            } else if prompt.contains("base form") {
                "run"
            } else {
                "To move swiftly on foot."
            };
            Ok(reply.to_string())
        }
    }

    struct Harness {
        dir: TempDir,
        dictionary: Arc<StubDictionary>,
        model: Arc<StubModel>,
        pipeline: WordPipeline,
    }

    fn harness(model: StubModel, config: AppConfig) -> Harness {
        let dir = TempDir::new().unwrap();
        let dictionary = Arc::new(StubDictionary::default());
        let model = Arc::new(model);
        let pipeline = WordPipeline::assemble(
            dictionary.clone(),
            model.clone(),
            &config,
            SourceCache::new(dir.path()),
        );

        Harness {
            dir,
            dictionary,
            model,
            pipeline,
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn files_in(dir: &TempDir, kind: &str) -> usize {
        std::fs::read_dir(dir.path().join(kind))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_run_is_resolved_and_backfilled() {
        let h = harness(StubModel::default(), AppConfig::default());

        let outcome = h.pipeline.process_word("run").await;

        assert_eq!(outcome.state(), WordState::Done);
        let entry = &outcome.entries()[0];
        assert_eq!(entry.phonetic, "/run/");
        assert_eq!(entry.definitions, "To move swiftly.");
        assert_eq!(entry.examples, "He ran away.");
        assert_eq!(entry.synonyms, "sprint; dash");
        assert_eq!(entry.antonyms, "walk; crawl");
        assert_eq!(h.model.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_word_is_skipped_without_caching() {
        let h = harness(StubModel::default(), AppConfig::default());

        let outcome = h.pipeline.process_word("xyzzqq").await;

        assert_eq!(
            outcome,
            WordOutcome::Skipped {
                word: "xyzzqq".to_string(),
                reason: LookupError::not_found("xyzzqq"),
            }
        );
        assert!(outcome.entries().is_empty());
        assert_eq!(files_in(&h.dir, "dictionary_lookup"), 0);
        assert_eq!(h.model.prompts.lock().unwrap().len(), 0);
        assert_eq!(h.pipeline.metrics().snapshot().words_skipped, 1);
    }

    #[tokio::test]
    async fn test_model_timeout_leaves_only_that_field_empty() {
        let h = harness(
            StubModel {
                time_out_on: Some("antonyms"),
                ..Default::default()
            },
            AppConfig::default(),
        );

        let outcome = h.pipeline.process_word("run").await;

        let entry = &outcome.entries()[0];
        assert_eq!(entry.synonyms, "sprint; dash");
        assert_eq!(entry.antonyms, "");
        assert_eq!(entry.definitions, "To move swiftly.");

        let snapshot = h.pipeline.metrics().snapshot();
        assert_eq!(snapshot.fields_backfilled, 1);
        assert_eq!(snapshot.fields_failed, 1);
    }

    #[tokio::test]
    async fn test_run_keeps_input_order_and_drops_skipped_words() {
        let h = harness(StubModel::default(), AppConfig::default());

        let entries = h
            .pipeline
            .run(&words(&["walk", "xyzzqq", "Run"]), &CancellationToken::new())
            .await;

        let order: Vec<&str> = entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(order, vec!["walk", "run"]);

        let snapshot = h.pipeline.metrics().snapshot();
        assert_eq!(snapshot.words_seen, 3);
        assert_eq!(snapshot.words_completed, 2);
        assert_eq!(snapshot.entries_emitted, 2);
    }

    #[tokio::test]
    async fn test_second_run_is_served_from_cache() {
        let h = harness(StubModel::default(), AppConfig::default());
        let list = words(&["run", "walk"]);

        let first = h.pipeline.run(&list, &CancellationToken::new()).await;
        let second = h.pipeline.run(&list, &CancellationToken::new()).await;

        assert_eq!(first, second);
        assert_eq!(h.dictionary.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.model.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_next_word() {
        let h = harness(StubModel::default(), AppConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let entries = h.pipeline.run(&words(&["run", "walk"]), &cancel).await;

        assert!(entries.is_empty());
        assert_eq!(h.dictionary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_dictionary_text() {
        let mut config = AppConfig::default();
        config.backfill.policy = MergePolicy::Overwrite;
        let h = harness(StubModel::default(), config);

        let outcome = h.pipeline.process_word("walk").await;

        let entry = &outcome.entries()[0];
        assert_eq!(entry.definitions, "To move swiftly on foot.");
        assert_eq!(entry.synonyms, "sprint; dash");
        assert_eq!(h.model.prompts.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_base_form_is_resolved_first_when_enabled() {
        let mut config = AppConfig::default();
        config.backfill.resolve_base_form = true;
        let h = harness(StubModel::default(), config);

        let outcome = h.pipeline.process_word("Running").await;

        match outcome {
            WordOutcome::Done { word, entries } => {
                assert_eq!(word, "run");
                assert_eq!(entries[0].word, "run");
            }
            other => panic!("expected a resolved word, got {:?}", other),
        }
        assert!(h.model.prompts.lock().unwrap()[0].contains("base form"));
    }

    #[test]
    fn test_from_config_builds_without_network() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.model.runtime = RuntimeKind::Http;

        assert!(WordPipeline::from_config(&config, SourceCache::new(dir.path())).is_ok());
    }
}
