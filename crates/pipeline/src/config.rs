use anyhow::{Context, Result, bail};
use enrich::{BackfillMode, MergePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WORDS_URL: &str =
    "https://raw.githubusercontent.com/manh-td/new-words/refs/heads/main/words.txt";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub dictionary: DictionaryConfig,
    pub model: ModelConfig,
    pub normalize: NormalizeConfig,
    pub backfill: BackfillConfig,
    pub words: WordsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Must end with a `{word}` path segment.
    pub url_template: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    Cli,  // local `ollama run` process
    Http, // Ollama server
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub runtime: RuntimeKind,
    pub model_id: String,
    pub program: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub max_senses: usize,
    pub max_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    pub policy: MergePolicy,
    pub mode: BackfillMode,
    pub resolve_base_form: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordsConfig {
    /// `http(s)://` URL or local path.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./cache"),
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            url_template: dictionary::DEFAULT_URL_TEMPLATE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::Cli,
            model_id: "gpt-oss:20b".to_string(),
            program: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            timeout_secs: 5 * 60,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_senses: 2,
            max_items: 2,
        }
    }
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_WORDS_URL.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.csv"),
        }
    }
}

impl DictionaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Defaults, then the TOML file if given, then `WORDFILL_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("WORDFILL_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("WORDFILL_MODEL") {
            self.model.model_id = model;
        }
        if let Some(runtime) = lookup("WORDFILL_MODEL_RUNTIME") {
            self.model.runtime = match runtime.to_lowercase().as_str() {
                "cli" => RuntimeKind::Cli,
                "http" => RuntimeKind::Http,
                other => bail!("WORDFILL_MODEL_RUNTIME must be 'cli' or 'http', got '{}'", other),
            };
        }
        if let Some(secs) = lookup("WORDFILL_MODEL_TIMEOUT_SECS") {
            self.model.timeout_secs = secs
                .parse()
                .with_context(|| format!("WORDFILL_MODEL_TIMEOUT_SECS is not a number: '{}'", secs))?;
        }
        if let Some(source) = lookup("WORDFILL_WORDS") {
            self.words.source = source;
        }
        if let Some(path) = lookup("WORDFILL_OUTPUT") {
            self.output.path = PathBuf::from(path);
        }
        Ok(())
    }
}
