use regex::Regex;
use std::sync::LazyLock;

static PLAYBACK_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/Items/\d+/PlaybackInfo").expect("valid pattern"));

static STREAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/Videos/([^/]+)/(?:stream|original)").expect("valid pattern")
});

static PLAYER_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)basehtmlplayer\.js").expect("valid pattern"));

/// How the dispatcher handles an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// Media description; intercepted and rewritten.
    PlaybackInfo,
    /// Stream request; may be answered with a redirect.
    Stream { item_id: String },
    /// Bundled web player script; patched.
    PlayerScript,
    /// Everything else; forwarded unmodified.
    Passthrough,
}

impl RouteKind {
    pub fn classify(path: &str) -> Self {
        if PLAYBACK_INFO.is_match(path) {
            return Self::PlaybackInfo;
        }

        if let Some(caps) = STREAM.captures(path) {
            let raw = &caps[1];
            let item_id = urlencoding::decode(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            return Self::Stream { item_id };
        }

        if PLAYER_SCRIPT.is_match(path) {
            return Self::PlayerScript;
        }

        Self::Passthrough
    }
}
