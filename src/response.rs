//! The response envelope returned by every endpoint.
//!
//! A [`Response`] carries the status code, the headers and a [`Body`] stream.
//! No endpoint-specific decoding happens here: a 404 or a 500 is a perfectly
//! valid `Response`, and interpreting it is up to the caller.

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;

/// A source of response body chunks.
///
/// Implemented for `reqwest::Response`; custom transports implement it for
/// their own connection types.
#[async_trait]
pub trait BodyStream: Send {
    /// Returns the next chunk, or `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

#[async_trait]
impl BodyStream for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunk().await?)
    }
}

struct Buffered(Option<Bytes>);

#[async_trait]
impl BodyStream for Buffered {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.0.take().filter(|b| !b.is_empty()))
    }
}

/// A response body owned by the caller.
///
/// The underlying connection is held until the body is read to the end or
/// dropped.
pub struct Body {
    inner: Box<dyn BodyStream>,
}

impl Body {
    /// An empty body.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// A body backed by bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: Box::new(Buffered(Some(bytes.into()))),
        }
    }

    /// A body backed by a stream.
    pub fn from_stream(stream: impl BodyStream + 'static) -> Self {
        Self {
            inner: Box::new(stream),
        }
    }

    /// Reads the next chunk.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.inner.next_chunk().await
    }

    /// Reads the whole body.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let first = match self.chunk().await? {
            Some(chunk) => chunk,
            None => return Ok(Bytes::new()),
        };
        let Some(second) = self.chunk().await? else {
            return Ok(first);
        };
        let mut buf = BytesMut::with_capacity(first.len() + second.len());
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second);
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Reads the whole body as text. Invalid UTF-8 is replaced.
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads the whole body and decodes it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize response body");
            Error::DeserializationFailed {
                raw_response: String::from_utf8_lossy(&bytes).into_owned(),
                serde_error: e.to_string(),
            }
        })
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body { .. }")
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

/// The normalized result of an endpoint call.
///
/// # Examples
///
/// ```
/// use esapi::{Body, Response};
/// use http::StatusCode;
///
/// let raw = http::Response::builder()
///     .status(404)
///     .header("warning", "299 Elasticsearch \"deprecated\"")
///     .body(Body::from(r#"{"error":"index_not_found_exception"}"#))
///     .unwrap();
///
/// let response = Response::from(raw);
/// assert_eq!(response.status, StatusCode::NOT_FOUND);
/// assert!(response.is_error());
/// assert!(response.has_warnings());
/// assert_eq!(response.to_string(), "[404 Not Found]");
/// ```
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body.
    pub body: Body,
}

impl Response {
    /// Creates a `Response`.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns `true` for any status above 299.
    pub fn is_error(&self) -> bool {
        self.status.as_u16() > 299
    }

    /// Returns the first value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns every `Warning` header value, typically deprecation notices.
    pub fn warnings(&self) -> Vec<&str> {
        self.headers
            .get_all(http::header::WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Returns `true` if the server sent any `Warning` headers.
    pub fn has_warnings(&self) -> bool {
        self.headers.contains_key(http::header::WARNING)
    }
}

impl From<http::Response<Body>> for Response {
    fn from(raw: http::Response<Body>) -> Self {
        let (parts, body) = raw.into_parts();
        Self::new(parts.status, parts.headers, body)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}]",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Unknown")
        )
    }
}
