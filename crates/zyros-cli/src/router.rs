//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands::{self, Context};
use crate::console::CliConsole;
use zyros_core::{ClientConfig, ZyrosClient, ZyrosResult};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: ClientConfig) -> ZyrosResult<()> {
    let console = CliConsole::new(cli.verbose);

    // Config commands never touch the API or the token store
    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show(&console, &config, cli.json),
            ConfigAction::Validate => commands::config::validate(&console, &config),
        };
    }

    let client = ZyrosClient::from_config(config)?;
    let state = client.initialize();
    tracing::debug!(?state, "session loaded");

    let mut events = client.events().subscribe();
    let background = client.spawn_background();
    let ctx = Context {
        client,
        console,
        json: cli.json,
    };

    let result = dispatch(&ctx, cli.command).await;

    while let Ok(event) = events.try_recv() {
        ctx.console.toast(&event);
    }
    background.shutdown().await;
    result
}

async fn dispatch(ctx: &Context, command: Commands) -> ZyrosResult<()> {
    match command {
        Commands::Login { username, password } => {
            commands::session::login(ctx, username, password).await
        }
        Commands::Register { username, password } => {
            commands::session::register(ctx, username, password).await
        }
        Commands::Logout => commands::session::logout(ctx),
        Commands::Whoami => commands::session::whoami(ctx),
        Commands::Feed {
            lang,
            post_type,
            page,
        } => commands::posts::feed(ctx, lang.map(Into::into), post_type.into(), page).await,
        Commands::Show { id } => commands::posts::show(ctx, id).await,
        Commands::Like { id } => commands::posts::like(ctx, id).await,
        Commands::Unlike { id } => commands::posts::unlike(ctx, id).await,
        Commands::Post {
            title,
            content,
            lang,
            image,
        } => {
            let draft = commands::posts::Draft {
                title,
                content,
                lang: lang.map(Into::into),
                image,
            };
            commands::posts::publish(ctx, draft, false).await
        }
        Commands::Article {
            title,
            content,
            lang,
            image,
        } => {
            let draft = commands::posts::Draft {
                title,
                content,
                lang: lang.map(Into::into),
                image,
            };
            commands::posts::publish(ctx, draft, true).await
        }
        Commands::Profile { username } => commands::profile::show(ctx, &username).await,
        Commands::Route { path } => commands::route::check(ctx, &path).await,
        Commands::Config { .. } => Ok(()),
    }
}
