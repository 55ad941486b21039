//! Session store
//!
//! The logged-in identity is never stored on its own; it is derived from the
//! token in storage every time the session is (re)loaded. Consumers observe
//! transitions through a watch channel.

use super::storage::TokenStorage;
use super::token::{TokenClaims, decode_token};
use crate::events::{ClientEvent, SharedEventBus};
use crate::routes::LOGIN_PATH;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Minimal reference to the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: u64,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            user_id: claims.user_id,
            username: claims.username,
            expires_at,
        }
    }
}

/// Session lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing has been read from storage yet
    #[default]
    Uninitialized,
    /// Storage is being read
    Loading,
    Authenticated(Identity),
    Anonymous,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// True until the first load settles
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Flat projection of the state
    pub fn session(&self) -> Session {
        Session {
            identity: self.identity().cloned(),
            loading: self.is_loading(),
        }
    }
}

/// Identity plus loading flag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    pub loading: bool,
}

/// Derives and publishes the current session
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    token_name: String,
    state: watch::Sender<SessionState>,
    events: Option<SharedEventBus>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>, token_name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            storage,
            token_name: token_name.into(),
            state,
            events: None,
        }
    }

    /// Publish transitions and navigations on the given bus
    pub fn with_events(mut self, events: SharedEventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn token_name(&self) -> &str {
        &self.token_name
    }

    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.storage
    }

    /// Current state
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Load the session from storage
    ///
    /// Always leaves the loading state, whatever storage holds.
    pub fn initialize(&self) -> SessionState {
        self.transition(SessionState::Loading);
        let next = self.derive_from_storage();
        self.transition(next.clone());
        next
    }

    /// Re-read storage after the transport stored a fresh token
    pub fn login(&self) -> SessionState {
        let next = self.derive_from_storage();
        if let SessionState::Authenticated(identity) = &next {
            tracing::info!(
                user_id = identity.user_id,
                username = identity.username.as_deref().unwrap_or(""),
                "logged in"
            );
        } else {
            tracing::debug!("login found no usable token");
        }
        self.transition(next.clone());
        next
    }

    /// Clear the token and become anonymous
    pub fn logout(&self) {
        self.clear_token();
        if self.current().is_authenticated() {
            tracing::info!("logged out");
        }
        self.transition(SessionState::Anonymous);
    }

    /// Reset after the API rejected the token
    pub fn handle_unauthorized(&self) {
        tracing::warn!("session rejected, redirecting to {}", LOGIN_PATH);
        self.logout();
        if let Some(events) = &self.events {
            events.publish(ClientEvent::navigate(LOGIN_PATH));
        }
    }

    /// Reset the session whenever the transport reports a 401
    ///
    /// The transport has already cleared the token and published the
    /// navigation, so this only moves the state.
    pub fn listen(self: &Arc<Self>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let mut events = self.events.as_ref()?.subscribe();
        let store = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(ClientEvent::Unauthorized { url }) => {
                            tracing::debug!(url = url.as_deref().unwrap_or(""), "unauthorized response");
                            store.logout();
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "session listener lagged behind the event bus");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        }))
    }

    /// Reset the session when the token's `exp` passes
    pub fn watch_expiry(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let mut states = self.subscribe();
        let store = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                let expires_at = states
                    .borrow_and_update()
                    .identity()
                    .and_then(|identity| identity.expires_at);

                match expires_at {
                    Some(expires_at) => {
                        let remaining = (expires_at - Utc::now())
                            .to_std()
                            .unwrap_or(Duration::ZERO);
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            changed = states.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                            }
                            _ = tokio::time::sleep(remaining) => {
                                tracing::info!("token expired");
                                store.handle_unauthorized();
                            }
                        }
                    }
                    None => {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            changed = states.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    fn derive_from_storage(&self) -> SessionState {
        let token = match self.storage.get(&self.token_name) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "failed to read token, treating as absent");
                None
            }
        };

        let Some(token) = token else {
            return SessionState::Anonymous;
        };

        match decode_token(&token) {
            Ok(claims) if claims.is_expired() => {
                tracing::warn!(user_id = claims.user_id, "stored token has expired");
                self.clear_token();
                SessionState::Anonymous
            }
            Ok(claims) => SessionState::Authenticated(claims.into()),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable token");
                self.clear_token();
                SessionState::Anonymous
            }
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.storage.remove(&self.token_name) {
            tracing::error!(error = %e, "failed to clear token");
        }
    }

    fn transition(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });

        if changed {
            tracing::debug!(state = ?next, "session transition");
            if let Some(events) = &self.events {
                events.publish(ClientEvent::SessionChanged(next));
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("token_name", &self.token_name)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::{MemoryTokenStorage, TokenStorageError};
    use crate::auth::token::tests::make_token;
    use crate::events::shared_event_bus;
    use serde_json::json;

    const TOKEN: &str = "token";

    fn valid_token(user_id: u64) -> String {
        let exp = Utc::now().timestamp() + 3600;
        make_token(json!({"userID": user_id, "username": "sara", "exp": exp}))
    }

    fn store_with(storage: Arc<MemoryTokenStorage>) -> SessionStore {
        SessionStore::new(storage, TOKEN)
    }

    /// Storage whose reads always fail
    struct BrokenStorage;

    impl TokenStorage for BrokenStorage {
        fn get(&self, _name: &str) -> Result<Option<String>, TokenStorageError> {
            Err(TokenStorageError::Storage("disk on fire".into()))
        }
        fn set(&self, _name: &str, _token: &str) -> Result<(), TokenStorageError> {
            Err(TokenStorageError::Storage("disk on fire".into()))
        }
        fn remove(&self, _name: &str) -> Result<(), TokenStorageError> {
            Err(TokenStorageError::Storage("disk on fire".into()))
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(store.current(), SessionState::Uninitialized);
        assert!(store.current().session().loading);
    }

    #[test]
    fn test_initialize_without_token() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(store.initialize(), SessionState::Anonymous);
        assert_eq!(store.current().session(), Session::default());
    }

    #[test]
    fn test_initialize_with_valid_token() {
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, valid_token(42)));
        let store = store_with(storage);

        let state = store.initialize();
        let identity = state.identity().unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.username.as_deref(), Some("sara"));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_malformed_token_is_cleared() {
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, "garbage"));
        let store = store_with(storage.clone());

        assert_eq!(store.initialize(), SessionState::Anonymous);
        assert!(storage.get(TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_expired_token_is_cleared() {
        let token = make_token(json!({"userID": 5, "exp": 1_000}));
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, token));
        let store = store_with(storage.clone());

        assert_eq!(store.initialize(), SessionState::Anonymous);
        assert!(storage.get(TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_storage_failure_never_blocks_loading() {
        let store = SessionStore::new(Arc::new(BrokenStorage), TOKEN);
        assert_eq!(store.initialize(), SessionState::Anonymous);

        store.logout();
        assert_eq!(store.current(), SessionState::Anonymous);
    }

    #[test]
    fn test_login_after_token_stored() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let store = store_with(storage.clone());
        store.initialize();

        storage.set(TOKEN, &valid_token(9)).unwrap();
        let state = store.login();
        assert_eq!(state.identity().map(|i| i.user_id), Some(9));
    }

    #[test]
    fn test_login_without_token_stays_anonymous() {
        let store = store_with(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(store.login(), SessionState::Anonymous);
    }

    #[test]
    fn test_logout_always_anonymous() {
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, valid_token(1)));
        let store = store_with(storage.clone());
        store.initialize();

        store.logout();
        assert_eq!(store.current(), SessionState::Anonymous);
        assert!(storage.get(TOKEN).unwrap().is_none());

        store.logout();
        assert_eq!(store.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_transitions_are_published() {
        let bus = shared_event_bus(16);
        let mut events = bus.subscribe();
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, valid_token(3)));
        let store = store_with(storage).with_events(bus);

        store.initialize();

        assert_eq!(
            events.recv().await.unwrap(),
            ClientEvent::SessionChanged(SessionState::Loading)
        );
        match events.recv().await.unwrap() {
            ClientEvent::SessionChanged(SessionState::Authenticated(identity)) => {
                assert_eq!(identity.user_id, 3)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_unauthorized_navigates_to_login() {
        let bus = shared_event_bus(16);
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, valid_token(3)));
        let store = store_with(storage.clone()).with_events(bus.clone());
        store.initialize();

        let mut events = bus.subscribe();
        store.handle_unauthorized();

        assert_eq!(
            events.recv().await.unwrap(),
            ClientEvent::SessionChanged(SessionState::Anonymous)
        );
        assert_eq!(events.recv().await.unwrap(), ClientEvent::navigate("/login"));
        assert!(storage.get(TOKEN).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listener_resets_on_unauthorized_event() {
        let bus = shared_event_bus(16);
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, valid_token(3)));
        let store = Arc::new(store_with(storage).with_events(bus.clone()));
        store.initialize();

        let cancel = CancellationToken::new();
        let handle = store.listen(cancel.clone()).unwrap();
        let mut states = store.subscribe();

        bus.publish(ClientEvent::Unauthorized {
            url: Some("/api/v1/posts/1/like".into()),
        });
        states
            .wait_for(|state| *state == SessionState::Anonymous)
            .await
            .unwrap();

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_watcher_resets_session() {
        let exp = Utc::now().timestamp() + 30;
        let token = make_token(json!({"userID": 8, "exp": exp}));
        let storage = Arc::new(MemoryTokenStorage::with_token(TOKEN, token));
        let store = Arc::new(store_with(storage.clone()));
        assert!(store.initialize().is_authenticated());

        let cancel = CancellationToken::new();
        let handle = store.watch_expiry(cancel.clone());

        let mut states = store.subscribe();
        states
            .wait_for(|state| *state == SessionState::Anonymous)
            .await
            .unwrap();
        assert!(storage.get(TOKEN).unwrap().is_none());

        cancel.cancel();
        handle.await.unwrap();
    }
}
