//! Zyros Client Core Library
//!
//! Client-side state orchestration for the Zyros bilingual blogging
//! platform: the session derived from the stored bearer token, route gating,
//! and a keyed server-state cache that stays consistent with the API through
//! invalidation after writes.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod mutation;
pub mod routes;
pub mod transport;
pub mod validation;

// Re-export commonly used types
pub use auth::{Identity, Session, SessionState, SessionStore, TokenStorage};
pub use cache::{CacheConfig, QueryCache, QueryKey, QueryObserver, QuerySnapshot, QueryStatus};
pub use client::{BackgroundTasks, ZyrosClient};
pub use config::{ClientConfig, ConfigLoader, load_config};
pub use error::{ZyrosError, ZyrosResult};
pub use events::{ClientEvent, EventBus, SharedEventBus};
pub use mutation::{Mutation, MutationRunner};
pub use routes::{GateDecision, LOGIN_PATH, Route};
pub use transport::{HttpTransport, Lang, PostType, Transport};
