//! Transparent `Content-Encoding` handling for intercepted bodies.

use axum::http::{self, HeaderMap, HeaderValue, header};
use bytes::Bytes;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};

use crate::Result;

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 5;
const BROTLI_LG_WINDOW: u32 = 22;

/// Body encodings the interceptors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Brotli,
    /// Anything else; bodies pass through untouched.
    Unsupported,
}

impl ContentEncoding {
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("identity") => Self::Identity,
            Some("gzip") | Some("x-gzip") => Self::Gzip,
            Some("br") => Self::Brotli,
            Some(_) => Self::Unsupported,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_header(
            headers
                .get(header::CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        )
    }

    /// Fully decompress `body`.
    pub fn decode(&self, body: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => {
                GzDecoder::new(body).read_to_end(&mut out)?;
            }
            Self::Brotli => {
                brotli::BrotliDecompress(&mut std::io::Cursor::new(body), &mut out)?;
            }
            Self::Identity | Self::Unsupported => out.extend_from_slice(body),
        }
        Ok(out)
    }

    /// Compress `content`, finishing the stream before returning.
    pub fn encode(&self, content: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(content)?;
                Ok(encoder.finish()?)
            }
            Self::Brotli => {
                let mut writer = brotli::CompressorWriter::new(
                    Vec::new(),
                    BROTLI_BUFFER_SIZE,
                    BROTLI_QUALITY,
                    BROTLI_LG_WINDOW,
                );
                writer.write_all(content)?;
                writer.flush()?;
                Ok(writer.into_inner())
            }
            Self::Identity | Self::Unsupported => Ok(content.to_vec()),
        }
    }
}

/// Narrow a client's `Accept-Encoding` to encodings [`ContentEncoding`] can
/// decode, so an intercepted response is never in a format we must skip.
pub fn restrict_accept_encoding(headers: &mut HeaderMap) {
    let accepted: Vec<String> = headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim())
        .filter(|token| {
            let coding = token.split(';').next().unwrap_or_default().trim();
            matches!(
                ContentEncoding::from_header(Some(coding)),
                ContentEncoding::Gzip | ContentEncoding::Brotli
            ) || coding.eq_ignore_ascii_case("identity")
        })
        .map(str::to_string)
        .collect();

    let value = if accepted.is_empty() {
        HeaderValue::from_static("identity")
    } else {
        HeaderValue::from_str(&accepted.join(", "))
            .unwrap_or_else(|_| HeaderValue::from_static("identity"))
    };
    headers.insert(header::ACCEPT_ENCODING, value);
}

/// Decode a captured response body according to its headers.
pub fn decode_body(response: &http::Response<Bytes>) -> Result<Vec<u8>> {
    ContentEncoding::from_headers(response.headers()).decode(response.body())
}

/// Re-encode `content` with the response's encoding and install it as the
/// new body, updating `Content-Length`.
pub fn replace_body(response: &mut http::Response<Bytes>, content: &[u8]) -> Result<()> {
    let encoded = ContentEncoding::from_headers(response.headers()).encode(content)?;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
    *response.body_mut() = Bytes::from(encoded);
    Ok(())
}
