use axum::{
    body::Body,
    extract::Request,
    http::{self, HeaderMap, header},
    response::Response,
};
use bytes::Bytes;
use reqwest::{Client, redirect::Policy};
use std::time::Duration;
use url::Url;

use super::headers::{forward_request_headers, forward_response_headers};
use crate::Result;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared outbound HTTP client.
///
/// Redirects are never followed and bodies are never decompressed; callers
/// set per-request timeouts where they need one.
pub fn http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Join a request path (and query) onto the backend base URL.
pub fn upstream_url(base: &Url, path: &str, query: Option<&str>) -> Url {
    let mut url = base.clone();
    url.set_path(&format!("{}{}", base.path().trim_end_matches('/'), path));
    url.set_query(query);
    url
}

/// Reverse-proxy transport to the media backend.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: Url,
}

impl ProxyClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Forward an inbound request to the backend unchanged.
    pub async fn forward(&self, request: Request) -> Result<reqwest::Response> {
        let (parts, body) = request.into_parts();
        let url = upstream_url(&self.base_url, parts.uri.path(), parts.uri.query());

        tracing::debug!("Forwarding {} {}", parts.method, url);

        let mut upstream = self
            .client
            .request(parts.method, url)
            .headers(forward_request_headers(&parts.headers));

        if has_body(&parts.headers) {
            upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        Ok(upstream.send().await?)
    }

    /// Forward a request and stream the backend response straight back.
    pub async fn passthrough(&self, request: Request) -> Result<Response> {
        let upstream = self.forward(request).await?;
        Ok(stream_response(upstream))
    }

    /// Forward a request and buffer the whole backend response.
    pub async fn capture(&self, request: Request) -> Result<http::Response<Bytes>> {
        let upstream = self.forward(request).await?;
        let status = upstream.status();
        let headers = forward_response_headers(upstream.headers());
        let body = upstream.bytes().await?;

        let mut captured = http::Response::new(body);
        *captured.status_mut() = status;
        *captured.headers_mut() = headers;
        Ok(captured)
    }
}

/// Convert a backend response into a streaming client response.
pub fn stream_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = forward_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn has_body(headers: &HeaderMap) -> bool {
    let declared_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0);
    declared_length || headers.contains_key(header::TRANSFER_ENCODING)
}
