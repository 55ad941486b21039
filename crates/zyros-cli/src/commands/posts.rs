//! Listings, single posts, likes and publishing

use super::{Context, print_json};
use std::path::{Path, PathBuf};
use zyros_core::error::OptionExt;
use zyros_core::transport::{ImageUpload, NewArticle, NewPost};
use zyros_core::{Lang, PostType, ZyrosError, ZyrosResult};

/// Title, body and optional image of something to publish
#[derive(Debug, Clone)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub lang: Option<Lang>,
    pub image: Option<PathBuf>,
}

pub async fn feed(
    ctx: &Context,
    lang: Option<Lang>,
    post_type: PostType,
    page: u32,
) -> ZyrosResult<()> {
    let lang = lang.unwrap_or(ctx.client.config().default_lang);
    let list = ctx.client.posts(lang, post_type, page).await?;

    if ctx.json {
        return print_json(&list);
    }

    ctx.console
        .print_header(&format!("{} · {} · page {}", lang, post_type, page));
    if list.posts.is_empty() {
        ctx.console.warn("Nothing here yet");
    }
    for post in &list.posts {
        ctx.console.print_post_line(post);
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: u64) -> ZyrosResult<()> {
    let post = ctx.client.post(id).await?;
    if ctx.json {
        return print_json(&post);
    }
    ctx.console.print_post(&post);
    Ok(())
}

pub async fn like(ctx: &Context, id: u64) -> ZyrosResult<()> {
    ctx.client.like(id).await
}

pub async fn unlike(ctx: &Context, id: u64) -> ZyrosResult<()> {
    ctx.client.unlike(id).await
}

pub async fn publish(ctx: &Context, draft: Draft, article: bool) -> ZyrosResult<()> {
    let lang = draft.lang.unwrap_or(ctx.client.config().default_lang);
    let image = match &draft.image {
        Some(path) => Some(read_image(path).await?),
        None => None,
    };

    let created = if article {
        let article = NewArticle {
            title: draft.title,
            content: draft.content,
            lang,
            image_url: None,
        };
        ctx.client.submit_article(article, image).await?
    } else {
        let post = NewPost {
            title: draft.title,
            content: draft.content,
            post_type: PostType::Post,
            lang,
            image_url: None,
        };
        ctx.client.submit_post(post, image).await?
    };

    if ctx.json {
        return print_json(&created);
    }
    ctx.console.info(&format!("Created #{}", created.id));
    Ok(())
}

async fn read_image(path: &Path) -> ZyrosResult<ImageUpload> {
    let content_type = image_content_type(path)
        .with_context(|| format!("Unsupported image type: {}", path.display()))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ZyrosError::storage_with_path(e.to_string(), path.display().to_string()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(ImageUpload {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("a/cat.PNG")), Some("image/png"));
        assert_eq!(image_content_type(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("notes.txt")), None);
        assert_eq!(image_content_type(Path::new("no_extension")), None);
    }

    #[tokio::test]
    async fn test_read_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = read_image(&path).await.unwrap();
        assert_eq!(image.file_name, "cat.png");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes.len(), 4);
    }

    #[tokio::test]
    async fn test_read_image_rejects_unknown_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        assert!(read_image(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_read_missing_image() {
        let err = read_image(Path::new("/definitely/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ZyrosError::Storage { .. }));
    }
}
