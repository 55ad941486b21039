//! CLI console utilities

use colored::*;
use dialoguer::{Password, theme::ColorfulTheme};
use zyros_core::error::Presentation;
use zyros_core::transport::{Post, UserProfile};
use zyros_core::{ClientEvent, ZyrosError};

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.chars().count()).dimmed());
    }

    /// Print an error the way its presentation asks for
    pub fn report(&self, error: &ZyrosError) {
        let facing = error.user_facing();
        self.error(&format!(
            "{}: {}",
            facing.category.display_name(),
            facing.message
        ));
        match facing.presentation {
            Presentation::Redirect { .. } => {
                self.warn("Run `zyros login <username>` to sign in again")
            }
            Presentation::Inline { fields } if !fields.is_empty() => {
                self.info(&format!("Check: {}", fields.join(", ")))
            }
            _ => {}
        }
    }

    /// Turn a client event into a notification line, if it deserves one
    pub fn toast(&self, event: &ClientEvent) {
        match event {
            ClientEvent::MutationSucceeded { kind } => self.success(&toast_text(kind, true)),
            ClientEvent::MutationFailed { kind, message } => {
                self.error(&format!("{} ({})", toast_text(kind, false), message))
            }
            ClientEvent::Navigate { to } => self.info(&format!("→ {}", to)),
            _ => {}
        }
    }

    pub fn print_post_line(&self, post: &Post) {
        println!("{}", post_line(post));
    }

    pub fn print_post(&self, post: &Post) {
        self.print_header(&post.title);
        let mut meta = vec![format!("#{}", post.id), post.lang.to_string()];
        if let Some(author) = post.author_username() {
            meta.push(format!("@{}", author));
        }
        if let Some(created) = post.created_at {
            meta.push(created.format("%Y-%m-%d %H:%M").to_string());
        }
        println!("{}", meta.join(" · ").dimmed());
        if let Some(url) = &post.image_url {
            println!("🖼 {}", url.cyan());
        }
        println!();
        println!("{}", post.content);
        println!();
        println!("{}", like_badge(post));
    }

    pub fn print_profile(&self, profile: &UserProfile) {
        self.print_header(&format!("@{}", profile.username));
        if let Some(bio) = &profile.bio {
            println!("{}", bio);
        }
        if let Some(picture) = &profile.profile_picture_url {
            println!("{}", picture.dimmed());
        }
    }

    /// Prompt for a secret without echoing it
    pub fn password(&self, prompt: &str) -> dialoguer::Result<String> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact()
    }
}

fn toast_text(kind: &str, succeeded: bool) -> String {
    let text = match (kind, succeeded) {
        ("create_post", true) => "Post published",
        ("create_article", true) => "Article published",
        ("like_post", true) => "Liked",
        ("unlike_post", true) => "Like removed",
        ("create_post", false) => "Could not publish the post",
        ("create_article", false) => "Could not publish the article",
        ("like_post", false) => "Could not like the post",
        ("unlike_post", false) => "Could not remove the like",
        (other, _) => other,
    };
    text.to_string()
}

fn like_badge(post: &Post) -> String {
    let heart = if post.is_liked_by_user { "♥" } else { "♡" };
    format!("{} {}", heart.red(), post.likes_count)
}

/// One listing row
fn post_line(post: &Post) -> String {
    let author = post
        .author_username()
        .map(|name| format!(" @{}", name))
        .unwrap_or_default();
    format!(
        "{}  {}{}  {}",
        format!("{:>5}", format!("#{}", post.id)).dimmed(),
        post.title.bold(),
        author.dimmed(),
        like_badge(post)
    )
}
