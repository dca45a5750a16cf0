use async_trait::async_trait;
use lexicon::RawLexicalRecord;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::error::LookupError;

pub const DEFAULT_URL_TEMPLATE: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/{word}";

/// Anything that can turn a normalized word into a dictionary record.
#[async_trait]
pub trait LexicalLookup: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<RawLexicalRecord, LookupError>;
}

/// Client for the Free Dictionary API (dictionaryapi.dev).
#[derive(Clone)]
pub struct FreeDictionaryClient {
    url_template: String,
    client: reqwest::Client,
}

impl FreeDictionaryClient {
    /// `url_template` must end with a `{word}` path segment.
    pub fn new(url_template: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url_template,
            client,
        })
    }

    /// The word is pushed as a percent-encoded path segment, so `what?` or
    /// `c#` cannot turn into a query or fragment.
    fn url_for(&self, word: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.url_template.replace("{word}", ""))
            .map_err(|e| LookupError::transport(word, format!("bad URL template: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| LookupError::transport(word, "URL template has no path"))?
            .pop_if_empty()
            .push(word);

        Ok(url)
    }
}

#[async_trait]
impl LexicalLookup for FreeDictionaryClient {
    async fn lookup(&self, word: &str) -> Result<RawLexicalRecord, LookupError> {
        let url = self.url_for(word)?;
        debug!(word = word, url = %url, "Fetching dictionary entry");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::transport(word, e))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(LookupError::not_found(word)),
            status => return Err(LookupError::transport(word, format!("status {}", status))),
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::transport(word, e))?;

        parse_entries(word, &body)
    }
}

/// The service answers with a JSON array; only its first element is used.
/// An unparsable body, an empty array, or an entry without meanings all mean
/// the word is not found.
pub fn parse_entries(word: &str, body: &[u8]) -> Result<RawLexicalRecord, LookupError> {
    let entries: Vec<RawLexicalRecord> = serde_json::from_slice(body).map_err(|e| {
        debug!(word = word, error = %e, "Unexpected dictionary response shape");
        LookupError::not_found(word)
    })?;

    entries
        .into_iter()
        .next()
        .filter(RawLexicalRecord::has_meanings)
        .ok_or_else(|| LookupError::not_found(word))
}
