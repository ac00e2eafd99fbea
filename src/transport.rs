//! The transport seam and its `reqwest` implementation.
//!
//! Endpoints never touch the network themselves. They render a
//! [`TransportRequest`] and hand it to a [`Transport`], which may pool, retry,
//! authenticate or mock as it sees fit.

use crate::response::Body;
use crate::scope::CancelScope;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A fully rendered request, ready to be sent.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,

    /// The URL path, always starting with `/`. Parameter segments are
    /// already percent-encoded.
    pub path: String,

    /// The encoded query string, without the leading `?`.
    pub query: String,

    /// Request headers.
    pub headers: HeaderMap,

    /// The request body.
    pub body: Option<Bytes>,

    /// The caller's cancellation scope. Transports abort the in-flight call
    /// when it fires.
    pub scope: Option<CancelScope>,
}

impl TransportRequest {
    /// Resolves the request against `base`, keeping any path prefix `base`
    /// already has.
    ///
    /// ```
    /// use esapi::TransportRequest;
    /// use http::{HeaderMap, Method};
    /// use url::Url;
    ///
    /// let request = TransportRequest {
    ///     method: Method::POST,
    ///     path: "/a,b/_forcemerge".to_string(),
    ///     query: "max_num_segments=5".to_string(),
    ///     headers: HeaderMap::new(),
    ///     body: None,
    ///     scope: None,
    /// };
    /// let base = Url::parse("https://proxy.local/es/").unwrap();
    /// assert_eq!(
    ///     request.url(&base).as_str(),
    ///     "https://proxy.local/es/a,b/_forcemerge?max_num_segments=5"
    /// );
    /// ```
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", prefix, self.path));
        if self.query.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.query));
        }
        url
    }
}

/// Performs rendered requests.
///
/// Implementations must be safe to call concurrently. Any HTTP status is a
/// successful `perform`; only failures to obtain a response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    async fn perform(&self, request: TransportRequest) -> Result<http::Response<Body>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn perform(&self, request: TransportRequest) -> Result<http::Response<Body>> {
        (**self).perform(request).await
    }
}

/// A [`Transport`] backed by a `reqwest::Client`.
///
/// # Examples
///
/// ```no_run
/// use esapi::ReqwestTransport;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), esapi::Error> {
/// let transport = ReqwestTransport::builder()
///     .base_url("http://localhost:9200")?
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "esapi/0.1")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

struct ReqwestTransportInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a new [`ReqwestTransportBuilder`].
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(&self, request: TransportRequest) -> Result<http::Response<Body>> {
        let url = request.url(&self.inner.base_url);
        let TransportRequest {
            method,
            mut headers,
            body,
            scope,
            ..
        } = request;

        // Defaults only fill in headers the call did not set.
        for (name, value) in &self.inner.default_headers {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        let mut builder = self.inner.http_client.request(method, url).headers(headers);

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        let send = builder.send();
        let sent = match scope {
            Some(scope) => tokio::select! {
                sent = send => sent,
                reason = scope.cancelled() => {
                    tracing::debug!(?reason, "Aborting in-flight request");
                    return Err(reason.into());
                }
            },
            None => send.await,
        };

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Network(e)
            }
        })?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();

        let mut raw = http::Response::new(Body::from_stream(response));
        *raw.status_mut() = status;
        *raw.version_mut() = version;
        *raw.headers_mut() = headers;
        Ok(raw)
    }
}

/// Builder for configuring and creating a [`ReqwestTransport`].
pub struct ReqwestTransportBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransportBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every request unless the call sets its own
    /// value for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets a per-request timeout enforced by the transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the HTTP client cannot
    /// be created.
    pub fn build(self) -> Result<ReqwestTransport> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ReqwestTransport {
            inner: Arc::new(ReqwestTransportInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, query: &str) -> TransportRequest {
        TransportRequest {
            method: Method::GET,
            path: path.to_string(),
            query: query.to_string(),
            headers: HeaderMap::new(),
            body: None,
            scope: None,
        }
    }

    #[test]
    fn test_url_without_query() {
        let base = Url::parse("http://localhost:9200").unwrap();
        assert_eq!(
            request("/_cluster/health", "").url(&base).as_str(),
            "http://localhost:9200/_cluster/health"
        );
    }

    #[test]
    fn test_url_root_path() {
        let base = Url::parse("http://localhost:9200/").unwrap();
        assert_eq!(request("/", "pretty=true").url(&base).as_str(), "http://localhost:9200/?pretty=true");
    }

    #[test]
    fn test_url_keeps_encoded_segments() {
        let base = Url::parse("http://localhost:9200").unwrap();
        assert_eq!(
            request("/books/_doc/a%252Fb", "").url(&base).path(),
            "/books/_doc/a%252Fb"
        );
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = ReqwestTransport::builder().build();
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_builder_rejects_bad_header() {
        let result = ReqwestTransport::builder().default_header("bad header", "x");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
