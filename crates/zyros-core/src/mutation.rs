//! Writes and the cache keys they invalidate
//!
//! A mutation awaits the API first and only then invalidates. A failed
//! mutation leaves the cache untouched.

use crate::cache::{QueryCache, QueryKey};
use crate::error::ZyrosResult;
use crate::events::ClientEvent;
use crate::transport::{Lang, PostType};
use std::future::Future;

/// Write operations the client performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreatePost { lang: Lang },
    CreateArticle { lang: Lang },
    LikePost { id: u64 },
    UnlikePost { id: u64 },
}

impl Mutation {
    /// Stable name used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreatePost { .. } => "create_post",
            Self::CreateArticle { .. } => "create_article",
            Self::LikePost { .. } => "like_post",
            Self::UnlikePost { .. } => "unlike_post",
        }
    }

    /// Prefixes covering every key whose data this write can change
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match *self {
            Self::CreatePost { lang } => vec![QueryKey::posts(lang, PostType::Post)],
            Self::CreateArticle { lang } => vec![QueryKey::posts(lang, PostType::Article)],
            // profile listings carry like counts too
            Self::LikePost { id } | Self::UnlikePost { id } => vec![
                QueryKey::all_posts(),
                QueryKey::post(id),
                QueryKey::all_user_posts(),
            ],
        }
    }
}

/// Runs writes against the cache
#[derive(Debug, Clone)]
pub struct MutationRunner {
    cache: QueryCache,
}

impl MutationRunner {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// Await `action`; on success invalidate the mutation's prefixes
    pub async fn mutate<T, Fut>(&self, mutation: Mutation, action: Fut) -> ZyrosResult<T>
    where
        Fut: Future<Output = ZyrosResult<T>>,
    {
        let kind = mutation.kind();
        tracing::debug!(kind, "running mutation");

        match action.await {
            Ok(value) => {
                let matched = self.cache.invalidate(&mutation.invalidates());
                tracing::debug!(kind, matched, "mutation acknowledged");
                if let Some(events) = self.cache.events() {
                    events.publish(ClientEvent::MutationSucceeded { kind });
                }
                Ok(value)
            }
            Err(error) => {
                tracing::warn!(kind, error = %error, "mutation failed");
                if let Some(events) = self.cache.events() {
                    events.publish(ClientEvent::MutationFailed {
                        kind,
                        message: error.display_message(),
                    });
                }
                Err(error)
            }
        }
    }
}

impl QueryCache {
    /// Shorthand for [`MutationRunner::mutate`]
    pub async fn mutate<T, Fut>(&self, mutation: Mutation, action: Fut) -> ZyrosResult<T>
    where
        Fut: Future<Output = ZyrosResult<T>>,
    {
        MutationRunner::new(self.clone()).mutate(mutation, action).await
    }
}
