//! Cache types and data structures

use crate::error::{ZyrosError, ZyrosResult};
use crate::transport::{Lang, PostType};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One scalar of a query key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Int(i64),
    Str(String),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for KeySegment {
    fn from(value: u64) -> Self {
        // Post ids and page numbers never get near i64::MAX
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i32> for KeySegment {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<Lang> for KeySegment {
    fn from(value: Lang) -> Self {
        Self::Str(value.as_str().to_string())
    }
}

impl From<PostType> for KeySegment {
    fn from(value: PostType) -> Self {
        Self::Str(value.as_str().to_string())
    }
}

/// Build a [`QueryKey`] from segments
///
/// ```
/// use zyros_core::query_key;
///
/// let key = query_key!["post", 7];
/// assert_eq!(key.to_string(), "[post, 7]");
/// ```
#[macro_export]
macro_rules! query_key {
    ($($segment:expr),* $(,)?) => {
        $crate::cache::QueryKey::new(vec![$($crate::cache::KeySegment::from($segment)),*])
    };
}

/// Ordered tuple identifying a cached query
///
/// Keys double as prefixes: `[posts]` covers `[posts, fa, post]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Whole-segment prefix match; the empty key matches everything
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// `[posts]`, every listing
    pub fn all_posts() -> Self {
        query_key!["posts"]
    }

    /// `[posts, <lang>, <type>]`
    pub fn posts(lang: Lang, post_type: PostType) -> Self {
        query_key!["posts", lang, post_type]
    }

    /// `[posts, <lang>, <type>, <page>]`
    pub fn posts_page(lang: Lang, post_type: PostType, page: u32) -> Self {
        Self::posts(lang, post_type).with(page)
    }

    /// `[post, <id>]`
    pub fn post(id: u64) -> Self {
        query_key!["post", id]
    }

    /// `[userProfile, <username>]`
    pub fn user_profile(username: &str) -> Self {
        query_key!["userProfile", username]
    }

    /// `[userPosts]`, every profile listing
    pub fn all_user_posts() -> Self {
        query_key!["userPosts"]
    }

    /// `[userPosts, <username>]`
    pub fn user_posts(username: &str) -> Self {
        query_key!["userPosts", username]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", segment)?;
        }
        write!(f, "]")
    }
}

impl FromIterator<KeySegment> for QueryKey {
    fn from_iter<I: IntoIterator<Item = KeySegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fetch status of a query entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Never fetched
    #[default]
    Idle,
    /// First fetch in flight, no data yet
    Pending,
    Success,
    Error,
}

/// Point-in-time view of one entry, as delivered to observers
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub key: QueryKey,
    pub status: QueryStatus,
    /// Last successful payload; kept across failed refetches
    pub data: Option<serde_json::Value>,
    pub error: Option<ZyrosError>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Stale at the moment the snapshot was taken
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl QuerySnapshot {
    pub(crate) fn empty(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            is_stale: true,
            is_fetching: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Deserialize the payload
    pub fn data_as<T: DeserializeOwned>(&self) -> ZyrosResult<Option<T>> {
        self.data
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(ZyrosError::from)
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which data is refetched on the next read
    #[serde(with = "humantime_serde")]
    pub stale_time: Duration,
    /// How long an unobserved entry survives
    #[serde(with = "humantime_serde")]
    pub retention_time: Duration,
    /// Period of the background sweep
    #[serde(with = "humantime_serde")]
    pub gc_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            retention_time: Duration::from_secs(10 * 60),
            gc_interval: Duration::from_secs(60),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Number of entries
    pub entries: usize,
    /// Entries with at least one observer
    pub observed_entries: usize,
    /// Fetches currently running
    pub in_flight: usize,
    /// Reads served from fresh data
    pub hits: u64,
    /// Reads that had to fetch or join a fetch
    pub misses: u64,
    /// Fetcher invocations
    pub fetches: u64,
    /// Entries marked stale by invalidation
    pub invalidations: u64,
    /// Entries dropped by garbage collection
    pub evictions: u64,
}

impl CacheStatistics {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_requests = self.hits + self.misses;
        if total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / total_requests as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching_is_per_segment() {
        let key = QueryKey::posts_page(Lang::Fa, PostType::Post, 2);
        assert!(key.starts_with(&QueryKey::all_posts()));
        assert!(key.starts_with(&QueryKey::posts(Lang::Fa, PostType::Post)));
        assert!(!key.starts_with(&QueryKey::posts(Lang::En, PostType::Post)));
        assert!(key.starts_with(&QueryKey::default()));

        // "post" is not a prefix of "posts"
        assert!(!key.starts_with(&query_key!["post"]));
        assert!(!QueryKey::post(7).starts_with(&QueryKey::all_posts()));
    }

    #[test]
    fn test_int_and_str_segments_differ() {
        assert_ne!(query_key!["post", 7], query_key!["post", "7"]);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(
            QueryKey::posts(Lang::En, PostType::Article).to_string(),
            "[posts, en, article]"
        );
        assert_eq!(QueryKey::user_posts("sara").to_string(), "[userPosts, sara]");
    }

    #[test]
    fn test_config_from_toml() {
        let config: CacheConfig = toml::from_str(
            r#"
            stale_time = "30s"
            retention_time = "2m"
            "#,
        )
        .unwrap();
        assert_eq!(config.stale_time, Duration::from_secs(30));
        assert_eq!(config.retention_time, Duration::from_secs(120));
        assert_eq!(config.gc_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStatistics {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStatistics::default().hit_rate(), 0.0);
    }
}
