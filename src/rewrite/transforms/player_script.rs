use async_trait::async_trait;
use axum::http;
use bytes::Bytes;

use super::{RequestContext, ResponseTransform};
use crate::proxy::codec::{decode_body, replace_body};

/// Expression in the bundled web player that requests remote direct-play
/// media with credentials, which cross-origin hosts reject.
const CROSS_ORIGIN_CHECK: &str = r#"mediaSource.IsRemote&&"DirectPlay"===playMethod?null:"anonymous""#;

/// Relaxes the web player's cross-origin setting for remote sources.
pub struct PlayerScriptPatch;

#[async_trait]
impl ResponseTransform for PlayerScriptPatch {
    fn name(&self) -> &'static str {
        "player-script-patch"
    }

    async fn transform(
        &self,
        mut response: http::Response<Bytes>,
        context: &RequestContext,
    ) -> http::Response<Bytes> {
        if !response.status().is_success() {
            return response;
        }

        let script = match decode_body(&response).map(String::from_utf8) {
            Ok(Ok(script)) => script,
            Ok(Err(e)) => {
                tracing::warn!("Player script {} is not UTF-8: {}", context.path, e);
                return response;
            }
            Err(e) => {
                tracing::warn!("Failed to decode player script {}: {}", context.path, e);
                return response;
            }
        };

        if !script.contains(CROSS_ORIGIN_CHECK) {
            return response;
        }

        let patched = script.replace(CROSS_ORIGIN_CHECK, "null");
        if let Err(e) = replace_body(&mut response, patched.as_bytes()) {
            tracing::warn!("Failed to re-encode player script {}: {}", context.path, e);
            return response;
        }

        tracing::info!("Patched cross-origin check in {}", context.path);
        response
    }
}
