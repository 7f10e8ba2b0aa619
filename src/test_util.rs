use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::{collections::HashMap, net::SocketAddr};
use tokio::net::TcpListener;

use crate::proxy::ContentEncoding;

/// Remote URL stored in the `.strm` item of the mock backend.
pub const STRM_SOURCE_URL: &str = "http://127.0.0.1:5244/movie.mp4";

/// Sources `21` and `22` of the two-version `.strm` item `20`.
pub const VERSION_A_URL: &str = "http://127.0.0.1:5244/version-a.mp4";
pub const VERSION_B_URL: &str = "http://127.0.0.1:5244/version-b.mp4";

/// Serve `app` on an ephemeral local port and return its address.
pub async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A small media backend:
///
/// | item | path | source |
/// |---|---|---|
/// | 7 | `/media/movie.strm` | Http, [`STRM_SOURCE_URL`] |
/// | 8 | `/media/local.mkv` | File |
/// | 10 | `/media/other.mp4` | Http, matches no `.strm` rule |
/// | 20 | `/media/versions.strm` | Http sources `21` and `22` |
/// | 500 | metadata lookup fails | |
pub fn mock_backend() -> Router {
    let api = Router::new()
        .route("/Items/{id}/PlaybackInfo", get(playback_info).post(playback_info))
        .route("/Videos/{id}/stream", get(|| async { "backend stream" }))
        .route(
            "/web/modules/htmlvideoplayer/basehtmlplayer.js",
            get(|| async {
                r#"a.crossOrigin=mediaSource.IsRemote&&"DirectPlay"===playMethod?null:"anonymous";"#
            }),
        )
        .route(
            "/System/Info",
            get(|| async { Json(json!({"Version": "4.8.0"})) }),
        );

    Router::new()
        .route("/Items", get(items))
        .merge(api.clone())
        .nest("/emby", api)
}

pub async fn spawn_backend() -> SocketAddr {
    spawn_upstream(mock_backend()).await
}

fn item(id: &str) -> Option<Value> {
    let (path, sources) = match id {
        "7" => ("/media/movie.strm", vec![("7", "Http", STRM_SOURCE_URL)]),
        "8" => ("/media/local.mkv", vec![("8", "File", "/media/local.mkv")]),
        "10" => (
            "/media/other.mp4",
            vec![("10", "Http", "http://127.0.0.1:5244/other.mp4")],
        ),
        "20" => (
            "/media/versions.strm",
            vec![("21", "Http", VERSION_A_URL), ("22", "Http", VERSION_B_URL)],
        ),
        _ => return None,
    };
    let sources: Vec<Value> = sources
        .into_iter()
        .map(|(id, protocol, path)| json!({"Id": id, "Protocol": protocol, "Path": path}))
        .collect();
    Some(json!({"Id": id, "Path": path, "MediaSources": sources}))
}

async fn items(Query(params): Query<HashMap<String, String>>) -> Response {
    let id = params.get("Ids").map(String::as_str).unwrap_or_default();
    if id == "500" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let items: Vec<Value> = item(id).into_iter().collect();
    Json(json!({"Items": items, "TotalRecordCount": items.len()})).into_response()
}

fn source(id: &str, protocol: &str, path: &str) -> Value {
    json!({
        "Id": format!("mediasource_{}", id),
        "ItemId": id,
        "Protocol": protocol,
        "Path": path,
        "Container": "mp4",
        "SupportsDirectPlay": false,
        "SupportsDirectStream": false,
        "SupportsTranscoding": true,
        "TranscodingUrl": format!("/videos/{}/master.m3u8?MediaSourceId={}", id, id),
        "TranscodingContainer": "ts",
        "TranscodingSubProtocol": "hls",
        "MediaStreams": [{"Type": "Video", "Codec": "h264", "Index": 0}]
    })
}

async fn playback_info(Path(id): Path<String>, headers: HeaderMap) -> Response {
    let payload = match id.as_str() {
        "7" => json!({
            "MediaSources": [source("7", "Http", STRM_SOURCE_URL)],
            "PlaySessionId": "session-7"
        }),
        "100" => json!({
            "MediaSources": [
                source("8", "File", "/media/local.mkv"),
                source("7", "Http", STRM_SOURCE_URL),
                source("10", "Http", "http://127.0.0.1:5244/other.mp4"),
                source("500", "Http", "http://127.0.0.1:5244/broken.mp4"),
            ],
            "PlaySessionId": "session-100"
        }),
        "666" => return (StatusCode::OK, "{not json").into_response(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let body = serde_json::to_vec(&payload).unwrap();
    let gzip = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("gzip"));

    if gzip {
        let encoded = ContentEncoding::Gzip.encode(&body).unwrap();
        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (header::CONTENT_ENCODING, HeaderValue::from_static("gzip")),
            ],
            encoded,
        )
            .into_response()
    } else {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response()
    }
}
