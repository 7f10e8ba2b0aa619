use reqwest::{Client, header};
use std::time::Duration;
use url::Url;

use crate::{Error, Result};

/// Maximum number of redirects chased before giving up and keeping the
/// last location reached.
pub const MAX_REDIRECT_HOPS: usize = 10;

const HOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Follows HTTP redirects with `HEAD` requests to find where a URL ends up.
#[derive(Clone)]
pub struct RedirectResolver {
    client: Client,
    max_hops: usize,
    hop_timeout: Duration,
}

impl RedirectResolver {
    /// `client` must not follow redirects itself.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_hops: MAX_REDIRECT_HOPS,
            hop_timeout: HOP_TIMEOUT,
        }
    }

    /// Resolve `url` to its final location.
    ///
    /// Exhausting the hop budget is not an error; the last location is
    /// returned. A transport failure or timeout on any hop is.
    pub async fn resolve(&self, url: &str, user_agent: Option<&str>) -> Result<String> {
        let mut current = url.to_string();
        let mut parsed = Url::parse(url)?;

        for hop in 0..self.max_hops {
            let mut request = self.client.head(parsed.clone()).timeout(self.hop_timeout);
            if let Some(ua) = user_agent {
                request = request.header(header::USER_AGENT, ua);
            }

            let response = request.send().await.map_err(|e| Error::RedirectFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            let status = response.status();
            if !status.is_redirection() {
                return Ok(current);
            }

            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| Error::RedirectFailed {
                    url: url.to_string(),
                    reason: format!("HTTP {} without a usable Location header", status),
                })?;

            // `join` handles both absolute and relative locations.
            parsed = parsed.join(location).map_err(|e| Error::RedirectFailed {
                url: url.to_string(),
                reason: format!("bad Location {:?}: {}", location, e),
            })?;
            current = parsed.to_string();

            tracing::debug!("Redirect hop {} -> {}", hop + 1, current);
        }

        tracing::debug!(
            "Redirect limit of {} reached for {}, using {}",
            self.max_hops,
            url,
            current
        );
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{proxy::client::http_client, test_util::spawn_upstream};
    use axum::{
        Router,
        extract::Path,
        http::{HeaderMap, StatusCode, header as http_header},
        response::{IntoResponse, Response},
        routing::get,
    };
    use std::net::SocketAddr;

    /// `/hop/{n}/{total}` redirects to `/hop/{n+1}/{total}` until `n == total`.
    async fn hop(Path((n, total)): Path<(u32, u32)>) -> Response {
        if n < total {
            (
                StatusCode::FOUND,
                [(http_header::LOCATION, format!("/hop/{}/{}", n + 1, total))],
            )
                .into_response()
        } else {
            StatusCode::OK.into_response()
        }
    }

    async fn absolute(headers: HeaderMap) -> Response {
        let host = headers
            .get(http_header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        (
            StatusCode::MOVED_PERMANENTLY,
            [(http_header::LOCATION, format!("http://{}/hop/0/0", host))],
        )
            .into_response()
    }

    async fn by_agent(headers: HeaderMap) -> Response {
        match headers.get(http_header::USER_AGENT).and_then(|v| v.to_str().ok()) {
            Some("TestPlayer/1.0") => {
                (StatusCode::FOUND, [(http_header::LOCATION, "/hop/0/0")]).into_response()
            }
            _ => StatusCode::OK.into_response(),
        }
    }

    async fn no_location() -> StatusCode {
        StatusCode::FOUND
    }

    async fn upstream() -> SocketAddr {
        let app = Router::new()
            .route("/hop/{n}/{total}", get(hop))
            .route("/absolute", get(absolute))
            .route("/agent", get(by_agent))
            .route("/broken", get(no_location));
        spawn_upstream(app).await
    }

    #[tokio::test]
    async fn test_no_redirect_returns_input() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let url = format!("http://{addr}/hop/0/0");
        assert_eq!(resolver.resolve(&url, None).await.unwrap(), url);
    }

    #[tokio::test]
    async fn test_follows_chain_to_final_url() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let resolved = resolver
            .resolve(&format!("http://{addr}/hop/0/3"), None)
            .await
            .unwrap();
        assert_eq!(resolved, format!("http://{addr}/hop/3/3"));
    }

    #[tokio::test]
    async fn test_hop_limit_returns_last_location() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let resolved = resolver
            .resolve(&format!("http://{addr}/hop/0/11"), None)
            .await
            .unwrap();
        assert_eq!(resolved, format!("http://{addr}/hop/10/11"));
    }

    #[tokio::test]
    async fn test_absolute_location() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let resolved = resolver
            .resolve(&format!("http://{addr}/absolute"), None)
            .await
            .unwrap();
        assert_eq!(resolved, format!("http://{addr}/hop/0/0"));
    }

    #[tokio::test]
    async fn test_user_agent_forwarded() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let url = format!("http://{addr}/agent");

        assert_eq!(resolver.resolve(&url, None).await.unwrap(), url);
        assert_eq!(
            resolver.resolve(&url, Some("TestPlayer/1.0")).await.unwrap(),
            format!("http://{addr}/hop/0/0")
        );
    }

    #[tokio::test]
    async fn test_missing_location_is_error() {
        let addr = upstream().await;
        let resolver = RedirectResolver::new(http_client());
        let err = resolver
            .resolve(&format!("http://{addr}/broken"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RedirectFailed { .. }));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let resolver = RedirectResolver::new(http_client());
        let err = resolver
            .resolve("http://127.0.0.1:1/movie.mp4", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RedirectFailed { .. }));
    }
}
