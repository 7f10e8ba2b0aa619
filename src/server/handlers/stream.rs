use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    Result,
    emby::strip_source_prefix,
    rewrite::{RequestContext, remote::resolve_remote_url},
    server::state::AppState,
};

/// Answer a stream request with a redirect to the remote source when a rule
/// applies, otherwise let the backend serve it.
pub async fn handle_stream(state: &AppState, item_id: &str, request: Request) -> Result<Response> {
    let context = RequestContext::new(request.uri(), request.headers());

    if let Some(target) = resolve_stream_target(state, item_id, &context).await {
        match HeaderValue::from_str(&target) {
            Ok(location) => {
                tracing::info!("Redirecting stream of item {} to {}", item_id, target);
                return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
            }
            Err(e) => tracing::warn!("Remote URL {:?} is not a valid Location: {}", target, e),
        }
    }

    state.proxy.passthrough(request).await
}

/// Remote URL for a stream request, or `None` when the backend should serve
/// it. Lookup failures are treated as "no rule applies".
async fn resolve_stream_target(
    state: &AppState,
    item_id: &str,
    context: &RequestContext,
) -> Option<String> {
    let media_source_id = context
        .query_param("MediaSourceId")
        .filter(|id| !id.is_empty())
        .map(strip_source_prefix)
        .unwrap_or(item_id);

    let items = match state.emby.query_item(item_id).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Item lookup for stream {} failed: {}", item_id, e);
            return None;
        }
    };

    let item = items.first()?;
    let item_path = item.path.as_deref()?;
    let source = item.find_source(media_source_id)?;
    let protocol = source.protocol.as_ref()?;
    let plan = state.rules.plan(item_path, protocol)?;
    let source_path = source.path.as_deref()?;

    Some(resolve_remote_url(source_path, &plan, context.user_agent(), &state.resolver).await)
}
