//! Login, registration and the current identity

use super::{Context, print_json};
use crate::console::CliConsole;
use colored::*;
use zyros_core::error::ResultExt;
use zyros_core::transport::Credentials;
use zyros_core::{SessionState, ZyrosResult};

pub async fn login(ctx: &Context, username: String, password: Option<String>) -> ZyrosResult<()> {
    let credentials = Credentials::new(username, resolve_password(&ctx.console, password)?);
    let state = ctx.client.sign_in(&credentials).await?;
    welcome(ctx, &state);
    Ok(())
}

pub async fn register(
    ctx: &Context,
    username: String,
    password: Option<String>,
) -> ZyrosResult<()> {
    let credentials = Credentials::new(username, resolve_password(&ctx.console, password)?);
    let state = ctx.client.sign_up(&credentials).await?;
    welcome(ctx, &state);
    Ok(())
}

pub fn logout(ctx: &Context) -> ZyrosResult<()> {
    let was_signed_in = ctx.client.session().current().is_authenticated();
    ctx.client.sign_out();
    if was_signed_in {
        ctx.console.success("Logged out");
    } else {
        ctx.console.warn("Not logged in");
    }
    Ok(())
}

pub fn whoami(ctx: &Context) -> ZyrosResult<()> {
    let state = ctx.client.session().current();
    let Some(identity) = state.identity() else {
        if ctx.json {
            return print_json(&serde_json::Value::Null);
        }
        ctx.console.warn("Not logged in");
        return Ok(());
    };

    if ctx.json {
        return print_json(identity);
    }

    let name = identity
        .username
        .clone()
        .unwrap_or_else(|| format!("user {}", identity.user_id));
    println!("{} (id {})", name.bold(), identity.user_id);
    if let Some(expires_at) = identity.expires_at {
        let local = expires_at.with_timezone(&chrono::Local);
        println!(
            "{} {}",
            "Session expires".dimmed(),
            local.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn welcome(ctx: &Context, state: &SessionState) {
    match state.identity() {
        Some(identity) => ctx.console.success(&format!(
            "Logged in as {}",
            identity.username.as_deref().unwrap_or("unknown user")
        )),
        None => ctx
            .console
            .warn("The server accepted the credentials but sent no usable token"),
    }
}

fn resolve_password(console: &CliConsole, password: Option<String>) -> ZyrosResult<String> {
    match password {
        Some(password) => Ok(password),
        None => console.password("Password").context("Failed to read password"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_given_password_skips_prompt() {
        let console = CliConsole::new(false);
        let password = resolve_password(&console, Some("secret1".to_string())).unwrap();
        assert_eq!(password, "secret1");
    }
}
