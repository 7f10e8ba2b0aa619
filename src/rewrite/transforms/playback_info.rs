//! PlaybackInfo interception.
//!
//! Marks remote (`.strm`-backed) media sources matched by a rule as
//! directly playable and points the client at a URL it can fetch without
//! the backend re-streaming the media.

use async_trait::async_trait;
use axum::http::{self, StatusCode};
use bytes::Bytes;
use std::sync::Arc;

use super::{RequestContext, ResponseTransform};
use crate::{
    emby::{EmbyClient, MediaSource, PlaybackInfoResponse},
    proxy::{
        RedirectResolver,
        codec::{decode_body, replace_body},
    },
    rewrite::remote::resolve_remote_url,
    rules::{RulePlan, RuleSet, UrlMode},
};

pub struct PlaybackInfoRewrite {
    emby: EmbyClient,
    rules: Arc<RuleSet>,
    resolver: RedirectResolver,
}

#[async_trait]
impl ResponseTransform for PlaybackInfoRewrite {
    fn name(&self) -> &'static str {
        "playback-info-rewrite"
    }

    async fn transform(
        &self,
        mut response: http::Response<Bytes>,
        context: &RequestContext,
    ) -> http::Response<Bytes> {
        if response.status() != StatusCode::OK {
            return response;
        }

        let decoded = match decode_body(&response) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Failed to decode PlaybackInfo body: {}", e);
                return response;
            }
        };

        let mut info: PlaybackInfoResponse = match serde_json::from_slice(&decoded) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("PlaybackInfo for {} is not valid JSON: {}", context.path, e);
                return response;
            }
        };

        if self.rewrite(&mut info, context).await == 0 {
            return response;
        }

        let body = match serde_json::to_vec(&info) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to serialize PlaybackInfo: {}", e);
                return response;
            }
        };

        if let Err(e) = replace_body(&mut response, &body) {
            tracing::warn!("Failed to re-encode PlaybackInfo: {}", e);
        }
        response
    }
}

impl PlaybackInfoRewrite {
    pub fn new(emby: EmbyClient, rules: Arc<RuleSet>, resolver: RedirectResolver) -> Self {
        Self {
            emby,
            rules,
            resolver,
        }
    }

    /// Rewrite matching sources in place and return how many were touched.
    ///
    /// Sources are only ever mutated, never added, removed or reordered.
    pub async fn rewrite(
        &self,
        info: &mut PlaybackInfoResponse,
        context: &RequestContext,
    ) -> usize {
        let mut rewritten = 0;

        for source in info.media_sources.iter_mut() {
            let Some(plan) = self.plan_for(source).await else {
                continue;
            };
            self.apply(source, &plan, context).await;
            rewritten += 1;
        }

        rewritten
    }

    /// Look up the owning item and fold the rules that apply to it.
    async fn plan_for(&self, source: &MediaSource) -> Option<RulePlan> {
        let protocol = source.protocol.as_ref().filter(|p| p.is_remote())?;
        let item_id = source.bare_id()?;

        let items = match self.emby.query_item(item_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Item lookup for media source {} failed: {}", item_id, e);
                return None;
            }
        };

        let Some(item_path) = items.first().and_then(|item| item.path.as_deref()) else {
            tracing::debug!("Item {} has no path, leaving source untouched", item_id);
            return None;
        };

        let plan = self.rules.plan(item_path, protocol);
        if plan.is_none() {
            tracing::debug!("No rule applies to {}", item_path);
        }
        plan
    }

    async fn apply(&self, source: &mut MediaSource, plan: &RulePlan, context: &RequestContext) {
        source.supports_direct_play = Some(true);
        source.supports_direct_stream = Some(true);
        if !plan.transcode {
            source.disable_transcoding();
        }

        match plan.mode {
            UrlMode::Proxy => {
                let Some(media_source_id) = source.id.clone() else {
                    return;
                };
                let item_id = source
                    .item_id
                    .clone()
                    .unwrap_or_else(|| source.bare_id().unwrap_or_default().to_string());

                let url = context.build_stream_url(&item_id, &media_source_id);
                tracing::info!("Source {} direct stream URL -> {}", media_source_id, url);
                source.direct_stream_url = Some(url);
            }
            UrlMode::Direct => {
                let Some(path) = source.path.clone() else {
                    tracing::warn!("Remote source {:?} has no path", source.id);
                    return;
                };

                let url =
                    resolve_remote_url(&path, plan, context.user_agent(), &self.resolver).await;
                tracing::info!("Source {:?} remote URL -> {}", source.id, url);
                source.direct_stream_url = Some(url.clone());
                source.path = Some(url);
            }
        }
    }
}
