//! Client facade
//!
//! Wires the session store, query cache, transport and event bus together
//! and exposes the queries and flows the application performs.

use crate::auth::{FileTokenStorage, SessionState, SessionStore, TokenStorage};
use crate::cache::{QueryCache, QueryKey, QueryObserver, fetcher};
use crate::config::ClientConfig;
use crate::error::{ZyrosError, ZyrosResult};
use crate::events::{SharedEventBus, shared_event_bus};
use crate::mutation::Mutation;
use crate::routes::{GateDecision, Route, gate};
use crate::transport::{
    Credentials, HttpTransport, ImageUpload, Lang, NewArticle, NewPost, Post, PostList, PostType,
    Transport, UserProfile,
};
use crate::validation::Validate;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const EVENT_BUS_CAPACITY: usize = 256;

/// Entry point of the client
pub struct ZyrosClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    cache: QueryCache,
    events: SharedEventBus,
}

impl ZyrosClient {
    /// HTTP client with file token storage, as configured
    pub fn from_config(config: ClientConfig) -> ZyrosResult<Self> {
        config.validate()?;

        let storage: Arc<dyn TokenStorage> = match &config.token_dir {
            Some(dir) => Arc::new(FileTokenStorage::new(dir)),
            None => Arc::new(FileTokenStorage::default_location()?),
        };
        let events = shared_event_bus(EVENT_BUS_CAPACITY);
        let transport = HttpTransport::new(
            &config.api_base_url,
            storage.clone(),
            config.token_name.clone(),
            config.request_timeout,
        )?
        .with_events(events.clone());

        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            storage,
            events,
        ))
    }

    /// Client over any transport; the transport must write the token into
    /// `storage` after login
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
        events: SharedEventBus,
    ) -> Self {
        let session = Arc::new(
            SessionStore::new(storage, config.token_name.clone()).with_events(events.clone()),
        );
        let cache = QueryCache::with_events(config.cache.clone(), events.clone());

        Self {
            config,
            transport,
            session,
            cache,
            events,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Load the session from storage
    pub fn initialize(&self) -> SessionState {
        self.session.initialize()
    }

    /// Start cache GC, the 401 listener and the expiry watcher
    pub fn spawn_background(&self) -> BackgroundTasks {
        let cancel = CancellationToken::new();
        let mut handles = vec![
            self.cache
                .spawn_gc(self.config.cache.gc_interval, cancel.child_token()),
            self.session.watch_expiry(cancel.child_token()),
        ];
        handles.extend(self.session.listen(cancel.child_token()));

        BackgroundTasks { cancel, handles }
    }

    /// Gate decision for a path; `None` for paths outside the route table
    pub fn gate(&self, path: &str) -> Option<GateDecision> {
        Route::parse(path).map(|route| gate(&route, &self.session.current()))
    }

    // ========== Queries ==========

    /// One page of a listing, cached under `[posts, lang, type, page]`
    pub async fn posts(&self, lang: Lang, post_type: PostType, page: u32) -> ZyrosResult<PostList> {
        let transport = self.transport.clone();
        let limit = self.config.page_size;
        self.cache
            .query_typed(QueryKey::posts_page(lang, post_type, page), move || {
                let transport = transport.clone();
                async move { transport.list_posts(lang, post_type, page, limit).await }
            })
            .await
    }

    /// Observe a listing page; the handle refetches after matching writes
    pub fn observe_posts(&self, lang: Lang, post_type: PostType, page: u32) -> QueryObserver {
        let transport = self.transport.clone();
        let limit = self.config.page_size;
        self.cache.observe(
            QueryKey::posts_page(lang, post_type, page),
            fetcher(move || {
                let transport = transport.clone();
                async move {
                    let posts = transport.list_posts(lang, post_type, page, limit).await?;
                    Ok(serde_json::to_value(posts)?)
                }
            }),
        )
    }

    /// A single post, cached under `[post, id]`
    pub async fn post(&self, id: u64) -> ZyrosResult<Post> {
        let transport = self.transport.clone();
        self.cache
            .query_typed(QueryKey::post(id), move || {
                let transport = transport.clone();
                async move { transport.get_post(id).await }
            })
            .await
    }

    /// Observe a single post
    pub fn observe_post(&self, id: u64) -> QueryObserver {
        let transport = self.transport.clone();
        self.cache.observe(
            QueryKey::post(id),
            fetcher(move || {
                let transport = transport.clone();
                async move { Ok(serde_json::to_value(transport.get_post(id).await?)?) }
            }),
        )
    }

    pub async fn user_profile(&self, username: &str) -> ZyrosResult<UserProfile> {
        let transport = self.transport.clone();
        let owned = username.to_string();
        self.cache
            .query_typed(QueryKey::user_profile(username), move || {
                let transport = transport.clone();
                let username = owned.clone();
                async move { transport.get_user_profile(&username).await }
            })
            .await
    }

    pub async fn user_posts(&self, username: &str) -> ZyrosResult<PostList> {
        let transport = self.transport.clone();
        let owned = username.to_string();
        self.cache
            .query_typed(QueryKey::user_posts(username), move || {
                let transport = transport.clone();
                let username = owned.clone();
                async move { transport.get_user_posts(&username).await }
            })
            .await
    }

    // ========== Flows ==========

    /// Log in and derive the session from the stored token
    pub async fn sign_in(&self, credentials: &Credentials) -> ZyrosResult<SessionState> {
        credentials.validate()?;
        self.transport.authenticate(credentials).await?;
        Ok(self.session.login())
    }

    /// Register; the API logs the new user in
    pub async fn sign_up(&self, credentials: &Credentials) -> ZyrosResult<SessionState> {
        credentials.validate()?;
        self.transport.register(credentials).await?;
        Ok(self.session.login())
    }

    pub fn sign_out(&self) {
        self.session.logout();
    }

    /// Validate, upload the optional image, create the post
    pub async fn submit_post(
        &self,
        mut post: NewPost,
        image: Option<ImageUpload>,
    ) -> ZyrosResult<Post> {
        post.validate()?;
        self.require_identity()?;
        if let Some(image) = image {
            post.image_url = Some(self.upload(image).await?);
        }

        let transport = self.transport.clone();
        self.cache
            .mutate(Mutation::CreatePost { lang: post.lang }, async move {
                transport.create_post(&post).await
            })
            .await
    }

    /// Validate, upload the optional image, create the article
    pub async fn submit_article(
        &self,
        mut article: NewArticle,
        image: Option<ImageUpload>,
    ) -> ZyrosResult<Post> {
        article.validate()?;
        self.require_identity()?;
        if let Some(image) = image {
            article.image_url = Some(self.upload(image).await?);
        }

        let transport = self.transport.clone();
        self.cache
            .mutate(Mutation::CreateArticle { lang: article.lang }, async move {
                transport.create_article(&article).await
            })
            .await
    }

    pub async fn like(&self, id: u64) -> ZyrosResult<()> {
        self.require_identity()?;
        self.cache
            .mutate(Mutation::LikePost { id }, self.transport.like_post(id))
            .await
            .map(|_| ())
    }

    pub async fn unlike(&self, id: u64) -> ZyrosResult<()> {
        self.require_identity()?;
        self.cache
            .mutate(Mutation::UnlikePost { id }, self.transport.unlike_post(id))
            .await
            .map(|_| ())
    }

    /// Like or unlike depending on the post's current state; returns the new
    /// state
    pub async fn toggle_like(&self, post: &Post) -> ZyrosResult<bool> {
        if post.is_liked_by_user {
            self.unlike(post.id).await?;
            Ok(false)
        } else {
            self.like(post.id).await?;
            Ok(true)
        }
    }

    fn require_identity(&self) -> ZyrosResult<()> {
        if self.session.current().is_authenticated() {
            Ok(())
        } else {
            Err(ZyrosError::auth("Login required"))
        }
    }

    /// Upload and return an absolute URL for the stored image
    async fn upload(&self, image: ImageUpload) -> ZyrosResult<String> {
        let uploaded = self.transport.upload_image(image).await?;
        resolve_upload_url(&self.config.api_base_url, &uploaded.url)
    }
}

impl std::fmt::Debug for ZyrosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZyrosClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("session", &self.session.current())
            .field("cache", &self.cache)
            .finish()
    }
}

/// The API answers uploads with a path such as `/uploads/x.png`
fn resolve_upload_url(api_base_url: &str, uploaded: &str) -> ZyrosResult<String> {
    let base = url::Url::parse(api_base_url)?;
    Ok(base.join(uploaded)?.to_string())
}

/// Handles of the client's background tasks
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Stop every task and wait for them to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStorage;
    use crate::transport::{ApiMessage, MockTransport, UploadedImage};
    use mockall::predicate::eq;

    fn client(transport: MockTransport, storage: Arc<MemoryTokenStorage>) -> ZyrosClient {
        ZyrosClient::with_transport(
            ClientConfig::default(),
            Arc::new(transport),
            storage,
            shared_event_bus(16),
        )
    }

    fn signed_in_storage() -> Arc<MemoryTokenStorage> {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = crate::auth::make_token(serde_json::json!({"userID": 1, "exp": exp}));
        Arc::new(MemoryTokenStorage::with_token("token", token))
    }

    fn sample_post(id: u64, liked: bool) -> Post {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": "عنوان",
            "content": "متن پست",
            "type": "post",
            "lang": "fa",
            "likesCount": 1,
            "isLikedByUser": liked,
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_upload_url() {
        assert_eq!(
            resolve_upload_url("http://localhost:8080/api/v1", "/uploads/a.png").unwrap(),
            "http://localhost:8080/uploads/a.png"
        );
        assert_eq!(
            resolve_upload_url("http://localhost:8080/api/v1", "https://cdn.example/a.png").unwrap(),
            "https://cdn.example/a.png"
        );
    }

    #[tokio::test]
    async fn test_invalid_credentials_never_reach_transport() {
        let mut transport = MockTransport::new();
        transport.expect_authenticate().never();

        let client = client(transport, Arc::new(MemoryTokenStorage::new()));
        let err = client
            .sign_in(&Credentials::new("ab", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ZyrosError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_sign_in_reads_stored_token() {
        let storage = Arc::new(MemoryTokenStorage::new());
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = crate::auth::make_token(serde_json::json!({"userID": 11, "exp": exp}));

        let mut transport = MockTransport::new();
        let cookie_jar = storage.clone();
        transport.expect_authenticate().times(1).returning(move |_| {
            cookie_jar.set("token", &token).unwrap();
            Ok(ApiMessage {
                message: Some("Login successful".into()),
            })
        });

        let client = client(transport, storage);
        client.initialize();
        let state = client.sign_in(&Credentials::new("sara", "secret1")).await.unwrap();
        assert_eq!(state.identity().map(|i| i.user_id), Some(11));
        assert_eq!(client.gate("/post"), Some(GateDecision::Render));
    }

    #[tokio::test]
    async fn test_posts_are_cached() {
        let mut transport = MockTransport::new();
        transport
            .expect_list_posts()
            .with(eq(Lang::Fa), eq(PostType::Post), eq(1), eq(10))
            .times(1)
            .returning(|_, _, _, _| {
                Ok(PostList {
                    posts: vec![sample_post(1, false)],
                })
            });

        let client = client(transport, Arc::new(MemoryTokenStorage::new()));
        let first = client.posts(Lang::Fa, PostType::Post, 1).await.unwrap();
        let second = client.posts(Lang::Fa, PostType::Post, 1).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.posts[0].title, "عنوان");
    }

    #[tokio::test]
    async fn test_submit_post_uploads_image_first() {
        let mut transport = MockTransport::new();
        transport.expect_upload_image().times(1).returning(|_| {
            Ok(UploadedImage {
                url: "/uploads/cover.png".into(),
            })
        });
        transport
            .expect_create_post()
            .withf(|post| {
                post.image_url.as_deref() == Some("http://localhost:8080/uploads/cover.png")
            })
            .times(1)
            .returning(|_| Ok(sample_post(5, false)));

        let client = client(transport, signed_in_storage());
        client.initialize();

        let post = NewPost {
            title: "سلام دنیا".into(),
            content: "اولین پست من در زیروس".into(),
            post_type: PostType::Post,
            lang: Lang::Fa,
            image_url: None,
        };
        let image = ImageUpload {
            file_name: "cover.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let created = client.submit_post(post, Some(image)).await.unwrap();
        assert_eq!(created.id, 5);
    }

    #[tokio::test]
    async fn test_anonymous_cannot_write() {
        let mut transport = MockTransport::new();
        transport.expect_like_post().never();

        let client = client(transport, Arc::new(MemoryTokenStorage::new()));
        client.initialize();

        let err = client.like(3).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_toggle_like_follows_post_state() {
        let mut transport = MockTransport::new();
        transport
            .expect_unlike_post()
            .with(eq(4))
            .times(1)
            .returning(|_| Ok(ApiMessage::default()));
        transport
            .expect_like_post()
            .with(eq(5))
            .times(1)
            .returning(|_| Ok(ApiMessage::default()));

        let client = client(transport, signed_in_storage());
        client.initialize();

        assert!(!client.toggle_like(&sample_post(4, true)).await.unwrap());
        assert!(client.toggle_like(&sample_post(5, false)).await.unwrap());
    }

    #[tokio::test]
    async fn test_background_tasks_shut_down() {
        let client = client(MockTransport::new(), Arc::new(MemoryTokenStorage::new()));
        client.initialize();

        let tasks = client.spawn_background();
        assert_eq!(tasks.handles.len(), 3);
        tasks.shutdown().await;
    }
}
