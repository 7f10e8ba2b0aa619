pub mod playback_info;
pub mod player_script;

use async_trait::async_trait;
use axum::http;
use bytes::Bytes;

use super::context::RequestContext;

pub use playback_info::PlaybackInfoRewrite;
pub use player_script::PlayerScriptPatch;

/// A rewrite applied to a fully captured upstream response.
///
/// Transforms never fail the request: on any problem they log and hand
/// back the response they were given.
#[async_trait]
pub trait ResponseTransform: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Transform the response.
    async fn transform(
        &self,
        response: http::Response<Bytes>,
        context: &RequestContext,
    ) -> http::Response<Bytes>;
}
