use anyhow::{Context, Result};
use tracing::debug;

/// First whitespace-separated token of every non-blank line.
pub fn parse_words(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// `source` is fetched when it is an `http(s)://` URL and read from disk otherwise.
pub async fn load_words(source: &str) -> Result<Vec<String>> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        debug!(url = source, "Downloading word list");
        reqwest::get(source)
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Failed to download word list: {}", source))?
            .text()
            .await
            .with_context(|| format!("Failed to read word list body: {}", source))?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read word list: {}", source))?
    };

    Ok(parse_words(&text))
}
