//! Route gate inspection

use super::{Context, print_json};
use colored::*;
use zyros_core::routes::await_decision;
use zyros_core::{GateDecision, Route, ZyrosError, ZyrosResult};

pub async fn check(ctx: &Context, path: &str) -> ZyrosResult<()> {
    let route = Route::parse(path)
        .ok_or_else(|| ZyrosError::not_found_resource(path.to_string(), "route"))?;
    let mut states = ctx.client.session().subscribe();
    let decision = await_decision(&route, &mut states).await;

    if ctx.json {
        return print_json(&serde_json::json!({
            "route": route.path(),
            "protected": route.is_protected(),
            "decision": describe(&decision),
        }));
    }

    let lock = if route.is_protected() { " (protected)" } else { "" };
    println!("{}{}  →  {}", route.to_string().bold(), lock.dimmed(), describe(&decision));
    Ok(())
}

fn describe(decision: &GateDecision) -> String {
    match decision {
        GateDecision::Wait => "wait".to_string(),
        GateDecision::Render => "render".to_string(),
        GateDecision::Redirect { to } => format!("redirect {}", to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(describe(&GateDecision::Render), "render");
        assert_eq!(
            describe(&GateDecision::Redirect {
                to: "/login".to_string()
            }),
            "redirect /login"
        );
    }
}
