use std::sync::Arc;

use crate::{
    Result,
    config::Config,
    emby::EmbyClient,
    proxy::{ProxyClient, RedirectResolver, client::http_client},
    rewrite::{PlaybackInfoRewrite, PlayerScriptPatch, TransformChain},
    rules::RuleSet,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyClient,
    pub emby: EmbyClient,
    pub rules: Arc<RuleSet>,
    pub resolver: RedirectResolver,
    pub playback_info: TransformChain,
    pub player_script: TransformChain,
}

impl AppState {
    /// Build every component on top of one pooled outbound client.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.emby.base_url()?;
        let client = http_client();

        let proxy = ProxyClient::new(client.clone(), base_url.clone());
        let emby = EmbyClient::new(client.clone(), base_url, config.emby.api_key.clone());
        let rules = Arc::new(RuleSet::compile(&config.emby.http_strm));
        let resolver = RedirectResolver::new(client);

        let playback_info = TransformChain::new(vec![Arc::new(PlaybackInfoRewrite::new(
            emby.clone(),
            rules.clone(),
            resolver.clone(),
        ))]);
        let player_script = TransformChain::new(vec![Arc::new(PlayerScriptPatch)]);

        Ok(Self {
            proxy,
            emby,
            rules,
            resolver,
            playback_info,
            player_script,
        })
    }
}
