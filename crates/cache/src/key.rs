use sha2::{Digest, Sha256};
use std::fmt;

/// What produced a cached artifact. Each kind gets its own subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    DictionaryLookup,
    ModelQuery,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::DictionaryLookup => "dictionary_lookup",
            CacheKind::ModelQuery => "model_query",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, filesystem-safe key for `(kind, key_material)`.
///
/// Callers are responsible for normalizing `key_material` (lower-cased word,
/// or `model_id:prompt`) before calling this.
pub fn cache_key(kind: CacheKind, key_material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(key_material.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16]) // 32 hex chars
}
