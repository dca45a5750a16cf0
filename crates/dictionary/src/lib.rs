pub mod client;
pub mod error;
pub mod resolver;

pub use client::{DEFAULT_URL_TEMPLATE, FreeDictionaryClient, LexicalLookup};
pub use error::LookupError;
pub use resolver::{DictionaryResolver, normalize_word};
