//! `reqwest` implementation of [`Transport`]

use super::Transport;
use super::types::{
    ApiMessage, Credentials, Envelope, ImageUpload, Lang, NewArticle, NewPost, Post, PostList,
    PostType, UploadedImage, UserProfile,
};
use crate::auth::TokenStorage;
use crate::error::{ZyrosError, ZyrosResult};
use crate::events::{ClientEvent, SharedEventBus};
use crate::routes::LOGIN_PATH;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, multipart};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// HTTP transport against `<host>/api/v1`
///
/// Attaches the stored token as a bearer header, stores the token cookie the
/// API sets on login, and resets the token on any 401.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    storage: Arc<dyn TokenStorage>,
    token_name: String,
    events: Option<SharedEventBus>,
}

impl HttpTransport {
    /// Create a transport; `base_url` is the API root, e.g.
    /// `http://localhost:8080/api/v1`
    pub fn new(
        base_url: &str,
        storage: Arc<dyn TokenStorage>,
        token_name: impl Into<String>,
        timeout: Duration,
    ) -> ZyrosResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ZyrosError::config(format!(
                "API base URL cannot carry paths: {}",
                base_url
            )));
        }

        // The jar keeps the CSRF cookie between calls
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("zyros/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            storage,
            token_name: token_name.into(),
            events: None,
        })
    }

    /// Publish 401 resets on the given bus
    pub fn with_events(mut self, events: SharedEventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> ZyrosResult<Url> {
        build_endpoint(&self.base_url, segments)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ZyrosResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        Ok(match self.stored_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn stored_token(&self) -> Option<String> {
        match self.storage.get(&self.token_name) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "failed to read token for request");
                None
            }
        }
    }

    fn capture_token(&self, headers: &HeaderMap) {
        let Some(token) = token_from_set_cookie(headers, &self.token_name) else {
            return;
        };

        let result = if token.is_empty() {
            self.storage.remove(&self.token_name)
        } else {
            self.storage.set(&self.token_name, &token)
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to store token from response cookie");
        }
    }

    fn reset_session(&self, url: &str) {
        tracing::warn!(url, "request unauthorized, clearing token");
        if let Err(e) = self.storage.remove(&self.token_name) {
            tracing::error!(error = %e, "failed to clear token");
        }
        if let Some(events) = &self.events {
            events.publish(ClientEvent::Unauthorized {
                url: Some(url.to_string()),
            });
            events.publish(ClientEvent::navigate(LOGIN_PATH));
        }
    }

    /// Send a request and decode the envelope; non-2xx becomes an error
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ZyrosResult<Envelope<T>> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        self.capture_token(response.headers());

        let body = response.bytes().await?;
        tracing::debug!(%url, status = status.as_u16(), bytes = body.len(), "api response");

        if status.is_success() {
            if body.is_empty() {
                return Ok(Envelope {
                    data: None,
                    message: None,
                    meta: None,
                    error: None,
                });
            }
            return Ok(serde_json::from_slice(&body)?);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.reset_session(&url);
        }

        Err(ZyrosError::from_status(status.as_u16(), error_message(status, &body)).with_context(url))
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ZyrosResult<T> {
        self.execute::<T>(builder).await?.into_data()
    }

    async fn acknowledge(&self, builder: RequestBuilder) -> ZyrosResult<ApiMessage> {
        let envelope = self.execute::<serde_json::Value>(builder).await?;
        Ok(ApiMessage {
            message: envelope.message,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(username = %credentials.username), level = "debug")]
    async fn authenticate(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage> {
        let request = self.request(Method::POST, &["login"])?.json(credentials);
        self.acknowledge(request).await
    }

    #[instrument(skip_all, fields(username = %credentials.username), level = "debug")]
    async fn register(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage> {
        let request = self.request(Method::POST, &["register"])?.json(credentials);
        self.acknowledge(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_posts(
        &self,
        lang: Lang,
        post_type: PostType,
        page: u32,
        limit: u32,
    ) -> ZyrosResult<PostList> {
        let request = self.request(Method::GET, &["posts"])?.query(&[
            ("lang", lang.as_str().to_string()),
            ("type", post_type.as_str().to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ]);
        self.data(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_post(&self, id: u64) -> ZyrosResult<Post> {
        let request = self.request(Method::GET, &["posts", &id.to_string()])?;
        self.data(request).await
    }

    #[instrument(skip_all, level = "debug")]
    async fn create_post(&self, post: &NewPost) -> ZyrosResult<Post> {
        let request = self.request(Method::POST, &["posts"])?.json(post);
        self.data(request).await
    }

    #[instrument(skip_all, level = "debug")]
    async fn create_article(&self, article: &NewArticle) -> ZyrosResult<Post> {
        let request = self.request(Method::POST, &["articles"])?.json(article);
        self.data(request).await
    }

    #[instrument(skip_all, fields(file = %image.file_name), level = "debug")]
    async fn upload_image(&self, image: ImageUpload) -> ZyrosResult<UploadedImage> {
        let part = multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = multipart::Form::new().part("image", part);
        let request = self.request(Method::POST, &["upload-image"])?.multipart(form);
        self.data(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_user_profile(&self, username: &str) -> ZyrosResult<UserProfile> {
        let request = self.request(Method::GET, &["users", username])?;
        self.data(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_user_posts(&self, username: &str) -> ZyrosResult<PostList> {
        let request = self.request(Method::GET, &["users", username, "posts"])?;
        self.data(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn like_post(&self, id: u64) -> ZyrosResult<ApiMessage> {
        let request = self.request(Method::POST, &["posts", &id.to_string(), "like"])?;
        self.acknowledge(request).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn unlike_post(&self, id: u64) -> ZyrosResult<ApiMessage> {
        let request = self.request(Method::DELETE, &["posts", &id.to_string(), "like"])?;
        self.acknowledge(request).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token_name", &self.token_name)
            .finish()
    }
}

/// Append percent-encoded segments to the API root
fn build_endpoint(base: &Url, segments: &[&str]) -> ZyrosResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ZyrosError::config(format!("API base URL cannot carry paths: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Value of the named cookie from `Set-Cookie` headers, if one was set
fn token_from_set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(cookie_name, _)| cookie_name.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// `error` from the envelope, else the status reason; empty becomes
/// "Unknown error" in [`ZyrosError::from_status`]
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string())
}
