//! Error types for endpoint calls.
//!
//! Only failures that prevent a response from being produced are errors. Any
//! HTTP status returned by the server, including 4xx and 5xx, is delivered as a
//! normal [`Response`](crate::Response).

use crate::scope::CancelReason;

/// The main error type for endpoint calls.
///
/// # Examples
///
/// ```no_run
/// use esapi::{endpoints, Endpoint, Error, ReqwestTransport};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Error> {
/// let transport = Arc::new(ReqwestTransport::builder().base_url("http://localhost:9200")?.build()?);
/// let info = Endpoint::new(&endpoints::INFO, transport);
///
/// match info.call([], []).await {
///     Ok(response) if response.is_error() => eprintln!("server said {}", response.status),
///     Ok(response) => println!("ok: {}", response.body.text().await?),
///     Err(Error::Network(e)) => eprintln!("could not reach the cluster: {}", e),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error raised by the `reqwest` transport.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// A failure reported by a custom [`Transport`](crate::Transport).
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The call's cancellation scope was cancelled.
    #[error("Request cancelled")]
    Cancelled,

    /// The call's cancellation scope reached its deadline.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// The positional arguments did not match the endpoint's required shape.
    #[error("Invalid arguments for {endpoint}: expected {expected}, got {got}")]
    InvalidArguments {
        /// The endpoint name
        endpoint: &'static str,
        /// Description of the expected arguments
        expected: String,
        /// Description of what was supplied
        got: String,
    },

    /// An option set a parameter the endpoint does not accept, or set it with
    /// the wrong kind of value.
    #[error("Endpoint {endpoint} does not accept parameter `{param}`: {reason}")]
    UnsupportedParameter {
        /// The endpoint name
        endpoint: &'static str,
        /// The parameter name
        param: String,
        /// Why it was rejected
        reason: String,
    },

    /// A header name or value supplied through options is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to serialize a request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Failed to decode a response body the caller asked to decode.
    #[error("Failed to deserialize response body: {serde_error}")]
    DeserializationFailed {
        /// The raw body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
    },

    /// Invalid transport configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Wraps an arbitrary transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(error.into())
    }

    /// Returns `true` if the error came from the transport rather than from
    /// request construction.
    ///
    /// ```
    /// use esapi::Error;
    ///
    /// assert!(Error::Timeout.is_transport_failure());
    /// assert!(!Error::InvalidHeader("bad".into()).is_transport_failure());
    /// ```
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout | Error::Transport(_)
        )
    }

    /// Returns `true` if the call ended because its scope was cancelled or
    /// expired.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<CancelReason> for Error {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => Error::Cancelled,
            CancelReason::DeadlineExceeded => Error::DeadlineExceeded,
        }
    }
}

/// A specialized `Result` type for endpoint calls.
pub type Result<T> = std::result::Result<T, Error>;
