//! API transport
//!
//! [`Transport`] is the contract the rest of the client programs against;
//! [`HttpTransport`] implements it over `reqwest`. Every call returns the
//! unwrapped `data` of the response envelope or a [`ZyrosError`] carrying
//! the HTTP status and the normalized message.
//!
//! [`ZyrosError`]: crate::error::ZyrosError

mod http;
pub mod types;

pub use http::HttpTransport;
pub use types::{
    ApiMessage, Credentials, Envelope, ImageUpload, Lang, NewArticle, NewPost, Post, PostAuthor,
    PostList, PostType, UploadedImage, UserProfile,
};

use crate::error::ZyrosResult;
use async_trait::async_trait;

/// Calls the client makes against the blogging API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// `POST /login`; the token arrives as a cookie
    async fn authenticate(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage>;

    /// `POST /register`; logs the new user in like `authenticate`
    async fn register(&self, credentials: &Credentials) -> ZyrosResult<ApiMessage>;

    /// `GET /posts?lang=&type=&page=&limit=`
    async fn list_posts(
        &self,
        lang: Lang,
        post_type: PostType,
        page: u32,
        limit: u32,
    ) -> ZyrosResult<PostList>;

    /// `GET /posts/{id}`
    async fn get_post(&self, id: u64) -> ZyrosResult<Post>;

    /// `POST /posts`
    async fn create_post(&self, post: &NewPost) -> ZyrosResult<Post>;

    /// `POST /articles`
    async fn create_article(&self, article: &NewArticle) -> ZyrosResult<Post>;

    /// `POST /upload-image` as multipart field `image`
    async fn upload_image(&self, image: ImageUpload) -> ZyrosResult<UploadedImage>;

    /// `GET /users/{username}`
    async fn get_user_profile(&self, username: &str) -> ZyrosResult<UserProfile>;

    /// `GET /users/{username}/posts`
    async fn get_user_posts(&self, username: &str) -> ZyrosResult<PostList>;

    /// `POST /posts/{id}/like`
    async fn like_post(&self, id: u64) -> ZyrosResult<ApiMessage>;

    /// `DELETE /posts/{id}/like`
    async fn unlike_post(&self, id: u64) -> ZyrosResult<ApiMessage>;
}
