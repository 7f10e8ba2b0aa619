use axum::http::{HeaderMap, Uri, header};
use url::form_urlencoded;

use crate::proxy::AuthParams;

/// Mount prefix some clients put in front of every backend path.
const MOUNT_PREFIX: &str = "/emby";

/// Per-request facts the interceptors need after the request itself has
/// been handed to the upstream transport.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Inbound request path.
    pub path: String,

    /// Decoded query pairs, in request order.
    pub query: Vec<(String, String)>,

    /// Credentials to carry onto rewritten URLs.
    pub auth: AuthParams,

    /// `"/emby"` (in the client's casing) when the client addressed the
    /// proxy through that mount, otherwise empty.
    pub url_prefix: String,

    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(uri: &Uri, headers: &HeaderMap) -> Self {
        let path = uri.path().to_string();
        let query: Vec<(String, String)> =
            form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect();

        Self {
            auth: AuthParams::collect(&query, headers),
            url_prefix: mount_prefix(&path).to_string(),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            path,
            query,
        }
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Query parameter by exact key, falling back to a case-insensitive match.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .or_else(|| self.query.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)))
            .map(|(_, v)| v.as_str())
    }

    /// Build the same-origin stream URL the redirect handler resolves later.
    pub fn build_stream_url(&self, item_id: &str, media_source_id: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.auth.pairs() {
            query.append_pair(k, v);
        }
        query.append_pair("MediaSourceId", media_source_id);
        query.append_pair("Static", "true");

        format!(
            "{}/Videos/{}/stream?{}",
            self.url_prefix,
            urlencoding::encode(item_id),
            query.finish()
        )
    }
}

fn mount_prefix(path: &str) -> &str {
    match path.get(..MOUNT_PREFIX.len()) {
        Some(head)
            if head.eq_ignore_ascii_case(MOUNT_PREFIX)
                && matches!(path.as_bytes().get(MOUNT_PREFIX.len()), None | Some(b'/')) =>
        {
            head
        }
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn context(uri: &str, headers: HeaderMap) -> RequestContext {
        RequestContext::new(&uri.parse::<Uri>().unwrap(), &headers)
    }

    #[test]
    fn test_mount_prefix() {
        assert_eq!(mount_prefix("/emby/Items/1/PlaybackInfo"), "/emby");
        assert_eq!(mount_prefix("/EMBY/Items/1/PlaybackInfo"), "/EMBY");
        assert_eq!(mount_prefix("/Items/1/PlaybackInfo"), "");
        assert_eq!(mount_prefix("/embyfoo/Items"), "");
        assert_eq!(mount_prefix("/emby"), "/emby");
    }

    #[test]
    fn test_query_param_case_fallback() {
        let ctx = context("/Videos/7/stream?mediasourceid=mediasource_7", HeaderMap::new());
        assert_eq!(ctx.query_param("MediaSourceId"), Some("mediasource_7"));
        assert_eq!(ctx.query_param("Static"), None);
    }

    #[test]
    fn test_build_stream_url_carries_auth() {
        let mut headers = HeaderMap::new();
        headers.insert("x-emby-client", HeaderValue::from_static("Emby Web"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("TestPlayer/1.0"));
        let ctx = context("/emby/Items/7/PlaybackInfo?api_key=k1&UserId=u", headers);

        assert_eq!(ctx.user_agent(), Some("TestPlayer/1.0"));
        assert_eq!(
            ctx.build_stream_url("7", "mediasource_7"),
            "/emby/Videos/7/stream?api_key=k1&X-Emby-Client=Emby+Web&MediaSourceId=mediasource_7&Static=true"
        );
    }

    #[test]
    fn test_build_stream_url_without_prefix() {
        let ctx = context("/Items/7/PlaybackInfo", HeaderMap::new());
        assert_eq!(
            ctx.build_stream_url("7", "7"),
            "/Videos/7/stream?MediaSourceId=7&Static=true"
        );
    }
}
