//! User profiles

use super::{Context, print_json};
use zyros_core::ZyrosResult;

pub async fn show(ctx: &Context, username: &str) -> ZyrosResult<()> {
    let (profile, posts) = tokio::try_join!(
        ctx.client.user_profile(username),
        ctx.client.user_posts(username),
    )?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "profile": profile,
            "posts": posts.posts,
        }));
    }

    ctx.console.print_profile(&profile);
    println!();
    if posts.posts.is_empty() {
        ctx.console.warn("No posts yet");
    }
    for post in &posts.posts {
        ctx.console.print_post_line(post);
    }
    Ok(())
}
