use axum::{
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};

use super::handle_stream;
use crate::{
    Result,
    proxy::codec::restrict_accept_encoding,
    rewrite::{RequestContext, RouteKind, TransformChain},
    server::state::AppState,
};

/// Fallback handler: every request the proxy receives lands here.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let route = RouteKind::classify(request.uri().path());
    let path = request.uri().path().to_string();

    let result = match route {
        RouteKind::PlaybackInfo => intercept(&state, &state.playback_info, request).await,
        RouteKind::PlayerScript => intercept(&state, &state.player_script, request).await,
        RouteKind::Stream { item_id } => handle_stream(&state, &item_id, request).await,
        RouteKind::Passthrough => state.proxy.passthrough(request).await,
    };

    result.unwrap_or_else(|e| {
        tracing::warn!("Upstream request for {} failed: {}", path, e);
        e.into_response()
    })
}

/// Buffer the backend response, run `chain` over it and return the result.
async fn intercept(
    state: &AppState,
    chain: &TransformChain,
    mut request: Request,
) -> Result<Response> {
    let context = RequestContext::new(request.uri(), request.headers());
    restrict_accept_encoding(request.headers_mut());

    let captured = state.proxy.capture(request).await?;
    let response = chain.apply(captured, &context).await;
    Ok(response.map(Body::from))
}
