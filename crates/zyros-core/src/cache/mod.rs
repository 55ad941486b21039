//! Server-state cache
//!
//! Query results keyed by [`QueryKey`], with:
//!
//! - a staleness window after which reads refetch
//! - a retention window after which unobserved entries are collected
//! - at most one in-flight fetch per key, shared by every caller
//! - observers that are refetched immediately when their key is invalidated
//!
//! Writes go through [`crate::mutation`] which invalidates the affected
//! prefixes once the API acknowledges them.

mod observer;
mod query_cache;
pub mod types;


pub use observer::QueryObserver;
pub use query_cache::{Fetcher, MIN_GC_INTERVAL, QueryCache, fetcher};
pub use types::{CacheConfig, CacheStatistics, KeySegment, QueryKey, QuerySnapshot, QueryStatus};
