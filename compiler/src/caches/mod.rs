//! Caching primitives: the segmented LRU cache, flexible cached values, name
//! caches and the compute-once map.

pub mod flexible;
pub mod memo;
pub mod name_cache;
pub mod slru;

pub use flexible::FlexibleCachedValue;
pub use memo::MemoMap;
pub use name_cache::{NameSet, SymbolNameCache};
pub use slru::{CacheStats, SlruCache};
