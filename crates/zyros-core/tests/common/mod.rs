//! In-memory API used by the integration tests
//!
//! Behaves like the HTTP transport from the client's point of view: login
//! writes a token into storage, protected calls without a token answer 401,
//! which clears storage and publishes the reset events.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use zyros_core::auth::{MemoryTokenStorage, TokenStorage};
use zyros_core::events::{ClientEvent, SharedEventBus, shared_event_bus};
use zyros_core::transport::{
    ApiMessage, Credentials, ImageUpload, Lang, NewArticle, NewPost, Post, PostAuthor, PostList,
    PostType, Transport, UploadedImage, UserProfile,
};
use zyros_core::{ClientConfig, ZyrosClient, ZyrosError, ZyrosResult};

pub const TOKEN_NAME: &str = "token";

/// Unsigned JWT-shaped token
pub fn make_token(user_id: u64, username: &str, ttl_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + ttl_secs;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"userID": user_id, "username": username, "exp": exp}).to_string(),
    );
    format!("{}.{}.c2ln", header, payload)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct State {
    users: HashMap<String, (u64, String)>,
    posts: Vec<Post>,
    likes: HashSet<(u64, u64)>,
    fail_writes: bool,
}

pub struct FakeApi {
    storage: Arc<MemoryTokenStorage>,
    events: SharedEventBus,
    state: Mutex<State>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new(storage: Arc<MemoryTokenStorage>, events: SharedEventBus) -> Self {
        Self {
            storage,
            events,
            state: Mutex::new(State::default()),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_user(&self, id: u64, username: &str, password: &str) {
        self.state
            .lock()
            .users
            .insert(username.to_string(), (id, password.to_string()));
    }

    pub fn add_post(&self, id: u64, lang: Lang, post_type: PostType, author: &str) {
        let mut state = self.state.lock();
        let author_id = state.users.get(author).map(|(id, _)| *id).unwrap_or(0);
        state.posts.push(Post {
            id,
            title: format!("Post {}", id),
            content: "Content long enough for validation".to_string(),
            post_type,
            lang,
            image_url: None,
            user_id: author_id,
            user: Some(PostAuthor {
                id: author_id,
                username: author.to_string(),
            }),
            likes_count: 0,
            is_liked_by_user: false,
            created_at: None,
        });
    }

    /// Make every write fail with a 500
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Forget the token server-side; the next protected call answers 401
    pub fn revoke_sessions(&self) {
        self.state.lock().users.clear();
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn viewer(&self) -> Option<u64> {
        let token = self.storage.get(TOKEN_NAME).ok()??;
        let claims = zyros_core::auth::decode_token(&token).ok()?;
        let state = self.state.lock();
        state
            .users
            .values()
            .any(|(id, _)| *id == claims.user_id)
            .then_some(claims.user_id)
    }

    fn require_viewer(&self, path: &str) -> ZyrosResult<u64> {
        match self.viewer() {
            Some(id) => Ok(id),
            None => {
                let _ = self.storage.remove(TOKEN_NAME);
                self.events.publish(ClientEvent::Unauthorized {
                    url: Some(path.to_string()),
                });
                self.events.publish(ClientEvent::navigate("/login"));
                Err(ZyrosError::from_status(401, "Invalid token"))
            }
        }
    }

    fn render(&self, post: &Post, viewer: Option<u64>, state: &State) -> Post {
        let mut post = post.clone();
        post.likes_count = state.likes.iter().filter(|(_, p)| *p == post.id).count() as u64;
        post.is_liked_by_user = viewer.is_some_and(|v| state.likes.contains(&(v, post.id)));
        post
    }

    fn create(&self, post: Post) -> ZyrosResult<Post> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(ZyrosError::from_status(500, "Failed to create post"));
        }
        state.posts.push(post.clone());
        Ok(post)
    }

    fn set_like(&self, id: u64, liked: bool) -> ZyrosResult<ApiMessage> {
        let viewer = self.require_viewer(&format!("/posts/{}/like", id))?;
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(ZyrosError::from_status(500, "Failed to like post"));
        }
        if liked {
            state.likes.insert((viewer, id));
        } else {
            state.likes.remove(&(viewer, id));
        }
        Ok(ApiMessage {
            message: Some(if liked { "Post liked" } else { "Post unliked" }.to_string()),
        })
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn authenticate(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage> {
        let user = self.state.lock().users.get(&credentials.username).cloned();
        match user {
            Some((id, password)) if password == credentials.password => {
                self.storage
                    .set(TOKEN_NAME, &make_token(id, &credentials.username, 3600))?;
                Ok(ApiMessage {
                    message: Some("Login successful".into()),
                })
            }
            _ => Err(ZyrosError::from_status(401, "Invalid credentials")),
        }
    }

    async fn register(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage> {
        let id = {
            let mut state = self.state.lock();
            if state.users.contains_key(&credentials.username) {
                return Err(ZyrosError::from_status(409, "Username already exists"));
            }
            let id = state.users.len() as u64 + 100;
            state
                .users
                .insert(credentials.username.clone(), (id, credentials.password.clone()));
            id
        };
        self.storage
            .set(TOKEN_NAME, &make_token(id, &credentials.username, 3600))?;
        Ok(ApiMessage::default())
    }

    async fn list_posts(
        &self,
        lang: Lang,
        post_type: PostType,
        page: u32,
        limit: u32,
    ) -> ZyrosResult<PostList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let viewer = self.viewer();
        let state = self.state.lock();
        let posts = state
            .posts
            .iter()
            .filter(|p| p.lang == lang && p.post_type == post_type)
            .skip(((page.max(1) - 1) * limit) as usize)
            .take(limit as usize)
            .map(|p| self.render(p, viewer, &state))
            .collect();
        Ok(PostList { posts })
    }

    async fn get_post(&self, id: u64) -> ZyrosResult<Post> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let viewer = self.viewer();
        let state = self.state.lock();
        state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| self.render(p, viewer, &state))
            .ok_or_else(|| ZyrosError::from_status(404, "Post not found"))
    }

    async fn create_post(&self, post: &NewPost) -> ZyrosResult<Post> {
        let viewer = self.require_viewer("/posts")?;
        let id = self.state.lock().posts.len() as u64 + 1;
        self.create(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            post_type: post.post_type,
            lang: post.lang,
            image_url: post.image_url.clone(),
            user_id: viewer,
            user: None,
            likes_count: 0,
            is_liked_by_user: false,
            created_at: Some(chrono::Utc::now()),
        })
    }

    async fn create_article(&self, article: &NewArticle) -> ZyrosResult<Post> {
        let viewer = self.require_viewer("/articles")?;
        let id = self.state.lock().posts.len() as u64 + 1;
        self.create(Post {
            id,
            title: article.title.clone(),
            content: article.content.clone(),
            post_type: PostType::Article,
            lang: article.lang,
            image_url: article.image_url.clone(),
            user_id: viewer,
            user: None,
            likes_count: 0,
            is_liked_by_user: false,
            created_at: Some(chrono::Utc::now()),
        })
    }

    async fn upload_image(&self, image: ImageUpload) -> ZyrosResult<UploadedImage> {
        self.require_viewer("/upload-image")?;
        Ok(UploadedImage {
            url: format!("/uploads/{}", image.file_name),
        })
    }

    async fn get_user_profile(&self, username: &str) -> ZyrosResult<UserProfile> {
        let state = self.state.lock();
        let (id, _) = state
            .users
            .get(username)
            .ok_or_else(|| ZyrosError::from_status(404, "User not found"))?;
        Ok(UserProfile {
            id: *id,
            username: username.to_string(),
            profile_picture_url: None,
            bio: None,
        })
    }

    async fn get_user_posts(&self, username: &str) -> ZyrosResult<PostList> {
        let viewer = self.viewer();
        let state = self.state.lock();
        let posts = state
            .posts
            .iter()
            .filter(|p| p.author_username() == Some(username))
            .map(|p| self.render(p, viewer, &state))
            .collect();
        Ok(PostList { posts })
    }

    async fn like_post(&self, id: u64) -> ZyrosResult<ApiMessage> {
        self.set_like(id, true)
    }

    async fn unlike_post(&self, id: u64) -> ZyrosResult<ApiMessage> {
        self.set_like(id, false)
    }
}

/// Client over a fake API with one user `sara` / `secret1` and a few posts
pub fn fixture() -> (ZyrosClient, Arc<FakeApi>, Arc<MemoryTokenStorage>) {
    init_tracing();

    let storage = Arc::new(MemoryTokenStorage::new());
    let events = shared_event_bus(64);
    let api = Arc::new(FakeApi::new(storage.clone(), events.clone()));
    api.add_user(1, "sara", "secret1");
    api.add_post(1, Lang::Fa, PostType::Post, "sara");
    api.add_post(2, Lang::Fa, PostType::Post, "sara");
    api.add_post(3, Lang::Fa, PostType::Article, "sara");
    api.add_post(4, Lang::En, PostType::Post, "sara");

    let client = ZyrosClient::with_transport(
        ClientConfig::default(),
        api.clone(),
        storage.clone(),
        events,
    );
    (client, api, storage)
}
