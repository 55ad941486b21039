//! CLI argument definitions using clap
//!
//! - zyros login <username>         # Log in, the token lands in ~/.zyros/tokens
//! - zyros feed --lang en           # Browse a listing
//! - zyros show <id>                # One post with its like state
//! - zyros like/unlike <id>         # Toggle a like
//! - zyros post/article ...         # Publish
//! - zyros route /post              # What the gate decides for a path

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use zyros_core::{Lang, PostType};

#[derive(Parser, Debug)]
#[command(name = "zyros")]
#[command(about = "Zyros - bilingual blogging client")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(long, global = true, env = "ZYROS_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in with username and password
    Login {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "ZYROS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        username: String,
        #[arg(long, env = "ZYROS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show who is logged in
    Whoami,

    /// List posts or articles
    Feed {
        /// Content language (defaults to the configured one)
        #[arg(long, value_enum)]
        lang: Option<LangArg>,

        #[arg(long = "type", value_enum, default_value = "post")]
        post_type: PostTypeArg,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show a single post
    Show { id: u64 },

    /// Like a post
    Like { id: u64 },

    /// Remove a like
    Unlike { id: u64 },

    /// Publish a short post
    Post {
        title: String,
        content: String,
        #[arg(long, value_enum)]
        lang: Option<LangArg>,
        /// Image file uploaded before the post is created
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Publish an article
    Article {
        title: String,
        content: String,
        #[arg(long, value_enum)]
        lang: Option<LangArg>,
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show a user's profile and posts
    Profile { username: String },

    /// Show the gate decision for a path
    Route { path: String },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Load and validate, reporting the first problem
    Validate,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangArg {
    Fa,
    En,
}

impl From<LangArg> for Lang {
    fn from(arg: LangArg) -> Self {
        match arg {
            LangArg::Fa => Lang::Fa,
            LangArg::En => Lang::En,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostTypeArg {
    Post,
    Article,
}

impl From<PostTypeArg> for PostType {
    fn from(arg: PostTypeArg) -> Self {
        match arg {
            PostTypeArg::Post => PostType::Post,
            PostTypeArg::Article => PostType::Article,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_defaults() {
        let cli = Cli::try_parse_from(["zyros", "feed"]).unwrap();
        match cli.command {
            Commands::Feed {
                lang,
                post_type,
                page,
            } => {
                assert_eq!(lang, None);
                assert_eq!(post_type, PostTypeArg::Post);
                assert_eq!(page, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_post_with_image() {
        let cli = Cli::try_parse_from([
            "zyros", "post", "Title", "Body text", "--lang", "en", "--image", "cat.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Post { lang, image, .. } => {
                assert_eq!(lang.map(Lang::from), Some(Lang::En));
                assert_eq!(image, Some(PathBuf::from("cat.png")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zyros", "whoami", "--verbose", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json);
    }

    #[test]
    fn test_unknown_lang_rejected() {
        assert!(Cli::try_parse_from(["zyros", "feed", "--lang", "de"]).is_err());
    }

    #[test]
    fn test_article_type_arg() {
        let cli = Cli::try_parse_from(["zyros", "feed", "--type", "article"]).unwrap();
        let Commands::Feed { post_type, .. } = cli.command else {
            panic!("expected feed");
        };
        assert_eq!(PostType::from(post_type), PostType::Article);
    }
}
