use axum::http::{HeaderMap, header};

/// Client credentials carried onto rewritten URLs, looked up in the query
/// string first and then in the request headers.
pub const AUTH_PARAM_KEYS: [&str; 7] = [
    "api_key",
    "X-Emby-Token",
    "X-Emby-Client",
    "X-Emby-Device-Id",
    "X-Emby-Device-Name",
    "X-Emby-Client-Version",
    "X-Emby-Language",
];

/// Whether a header is connection-scoped and must not cross the proxy.
fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name,
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers to send upstream for an inbound request.
///
/// `Host` is dropped so the outbound client addresses the backend by its own name.
pub fn forward_request_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| {
            name.as_str() != header::HOST.as_str() && !is_hop_by_hop(name.as_str())
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Headers to return to the client for a backend response.
pub fn forward_response_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Authentication parameters collected from an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    pairs: Vec<(String, String)>,
}

impl AuthParams {
    /// Collect the allow-listed keys, preferring query values over headers.
    pub fn collect(query: &[(String, String)], headers: &HeaderMap) -> Self {
        let pairs = AUTH_PARAM_KEYS
            .iter()
            .filter_map(|&key| {
                let from_query = query
                    .iter()
                    .find(|(k, v)| k == key && !v.is_empty())
                    .map(|(_, v)| v.clone());
                let value = from_query.or_else(|| {
                    headers
                        .get(key)
                        .and_then(|v| v.to_str().ok())
                        .filter(|v| !v.is_empty())
                        .map(String::from)
                })?;
                Some((key.to_string(), value))
            })
            .collect();

        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}
