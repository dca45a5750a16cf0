pub mod normalizer;
pub mod schema;

pub use normalizer::{EntryNormalizer, ITEM_SEPARATOR};
pub use schema::{Definition, Field, Meaning, Phonetic, RawLexicalRecord, SenseEntry};
