use crate::{proxy::RedirectResolver, rules::RulePlan};

/// Turn a remote source path into the URL handed to the client: the plan's
/// replacements first, then, if asked, the final redirect target.
///
/// A failed resolution keeps the rewritten candidate.
pub async fn resolve_remote_url(
    source_path: &str,
    plan: &RulePlan,
    user_agent: Option<&str>,
    resolver: &RedirectResolver,
) -> String {
    let candidate = plan.rewrite_url(source_path);
    if !plan.final_url {
        return candidate;
    }

    match resolver.resolve(&candidate, user_agent).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!("Keeping unresolved URL {}: {}", candidate, e);
            candidate
        }
    }
}
