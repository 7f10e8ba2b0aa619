use axum::http;
use bytes::Bytes;
use std::sync::Arc;

use super::{context::RequestContext, transforms::ResponseTransform};

/// Ordered set of response transforms applied to one captured response.
#[derive(Clone, Default)]
pub struct TransformChain {
    transforms: Vec<Arc<dyn ResponseTransform>>,
}

impl TransformChain {
    pub fn new(transforms: Vec<Arc<dyn ResponseTransform>>) -> Self {
        Self { transforms }
    }

    /// Run every transform in order, feeding each the previous output.
    pub async fn apply(
        &self,
        mut response: http::Response<Bytes>,
        context: &RequestContext,
    ) -> http::Response<Bytes> {
        for transform in &self.transforms {
            tracing::debug!("Applying {} to {}", transform.name(), context.path);
            response = transform.transform(response, context).await;
        }
        response
    }
}
