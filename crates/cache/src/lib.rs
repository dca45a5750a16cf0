pub mod key;
pub mod store;

pub use key::{CacheKind, cache_key};
pub use store::{CacheStats, SourceCache};
