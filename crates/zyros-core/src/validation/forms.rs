//! Schema bindings for the request bodies the client sends

use super::errors::ValidationResult;
use super::schema::{FieldSource, Validate, article_schema, credentials_schema, post_schema};
use crate::transport::{Credentials, NewArticle, NewPost};

impl FieldSource for Credentials {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "username" => Some(&self.username),
            "password" => Some(&self.password),
            _ => None,
        }
    }
}

impl Validate for Credentials {
    fn validate(&self) -> ValidationResult {
        credentials_schema().validate(self)
    }
}

impl FieldSource for NewPost {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "content" => Some(&self.content),
            "type" => Some(self.post_type.as_str()),
            "lang" => Some(self.lang.as_str()),
            "imageUrl" => self.image_url.as_deref(),
            _ => None,
        }
    }
}

impl Validate for NewPost {
    fn validate(&self) -> ValidationResult {
        post_schema().validate(self)
    }
}

impl FieldSource for NewArticle {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "content" => Some(&self.content),
            "lang" => Some(self.lang.as_str()),
            "imageUrl" => self.image_url.as_deref(),
            _ => None,
        }
    }
}

impl Validate for NewArticle {
    fn validate(&self) -> ValidationResult {
        article_schema().validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Lang, PostType};

    #[test]
    fn test_credentials_schema() {
        assert!(Credentials::new("ali", "secret1").validate().is_ok());

        let errors = Credentials::new("al", "123").validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "password"]);
        assert!(errors.iter().all(|e| e.code == "min_length"));
    }

    #[test]
    fn test_post_schema_collects_every_field() {
        let post = NewPost {
            title: "".into(),
            content: "short".into(),
            post_type: PostType::Post,
            lang: Lang::Fa,
            image_url: Some("nope".into()),
        };
        let errors = post.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.for_field("title").next().unwrap().code, "required");
        assert_eq!(errors.for_field("content").next().unwrap().code, "min_length");
        assert_eq!(errors.for_field("imageUrl").next().unwrap().code, "url");
    }

    #[test]
    fn test_article_without_image_is_valid() {
        let article = NewArticle {
            title: "Rust و وب".into(),
            content: "یک مقاله‌ی طولانی درباره‌ی راست".into(),
            lang: Lang::Fa,
            image_url: None,
        };
        assert!(article.validate().is_ok());
    }
}
