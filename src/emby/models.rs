//! Backend payloads.
//!
//! Only the fields the rewriter reads or writes are typed; everything else
//! rides along in a flattened map so a rewritten payload loses nothing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Prefix some backend versions put on media source identifiers.
pub const MEDIA_SOURCE_PREFIX: &str = "mediasource_";

/// Strip the `mediasource_` prefix from a media source identifier.
pub fn strip_source_prefix(id: &str) -> &str {
    id.strip_prefix(MEDIA_SOURCE_PREFIX).unwrap_or(id)
}

/// Media source transport protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    File,
    Http,
    Https,
    Rtmp,
    Rtsp,
    Udp,
    Rtp,
    Ftp,
    Mms,
    Other(String),
}

impl Protocol {
    /// Whether the source path is a remote URL the client can fetch itself.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

impl From<String> for Protocol {
    fn from(s: String) -> Self {
        match s.as_str() {
            "File" => Self::File,
            "Http" => Self::Http,
            "Https" => Self::Https,
            "Rtmp" => Self::Rtmp,
            "Rtsp" => Self::Rtsp,
            "Udp" => Self::Udp,
            "Rtp" => Self::Rtp,
            "Ftp" => Self::Ftp,
            "Mms" => Self::Mms,
            _ => Self::Other(s),
        }
    }
}

impl From<Protocol> for String {
    fn from(p: Protocol) -> Self {
        match p {
            Protocol::File => "File".into(),
            Protocol::Http => "Http".into(),
            Protocol::Https => "Https".into(),
            Protocol::Rtmp => "Rtmp".into(),
            Protocol::Rtsp => "Rtsp".into(),
            Protocol::Udp => "Udp".into(),
            Protocol::Rtp => "Rtp".into(),
            Protocol::Ftp => "Ftp".into(),
            Protocol::Mms => "Mms".into(),
            Protocol::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_direct_play: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_direct_stream: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_transcoding: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_stream_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcoding_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcoding_container: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcoding_sub_protocol: Option<String>,

    /// Always serialized; clients reject sources without it.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub media_streams: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaSource {
    /// Identifier without the `mediasource_` prefix.
    pub fn bare_id(&self) -> Option<&str> {
        self.id.as_deref().map(strip_source_prefix)
    }

    pub fn is_remote(&self) -> bool {
        self.protocol.as_ref().is_some_and(Protocol::is_remote)
    }

    /// Drop every transcoding capability the backend advertised.
    pub fn disable_transcoding(&mut self) {
        self.supports_transcoding = Some(false);
        self.transcoding_url = None;
        self.transcoding_container = None;
        self.transcoding_sub_protocol = None;
    }
}

/// Body of `/Items/<id>/PlaybackInfo`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackInfoResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub media_sources: Vec<MediaSource>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/Items?Ids=...`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<BaseItem>,
}

impl ItemsResponse {
    pub fn first(&self) -> Option<&BaseItem> {
        self.items.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseItem {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub media_sources: Vec<MediaSource>,
}

impl BaseItem {
    /// Find the source for a (possibly prefixed) media source identifier.
    ///
    /// Falls back to the only source when the item has exactly one, since
    /// identifiers don't always agree between backend versions.
    pub fn find_source(&self, media_source_id: &str) -> Option<&MediaSource> {
        let wanted = strip_source_prefix(media_source_id);
        self.media_sources
            .iter()
            .find(|ms| ms.bare_id() == Some(wanted))
            .or_else(|| match self.media_sources.as_slice() {
                [only] => Some(only),
                _ => None,
            })
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
