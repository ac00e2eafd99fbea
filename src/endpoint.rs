//! Endpoints as data, and the single dispatch routine they share.
//!
//! Each API operation is an [`EndpointSpec`]: a method, a path template, the
//! names of its required positional arguments, its body rule and its legal
//! query parameters. [`Endpoint`] pairs an [`EndpointSpec`] with a
//! [`Transport`] and turns a call into a request:
//!
//! 1. a fresh [`Descriptor`] is filled from the positional arguments,
//! 2. options are applied in order,
//! 3. the descriptor is checked against the [`EndpointSpec`] and rendered,
//! 4. headers, body and scope are attached,
//! 5. the transport performs the request and the result is wrapped in a
//!    [`Response`].
//!
//! # Examples
//!
//! ```no_run
//! use esapi::options::{with_index, with_int, with_pretty};
//! use esapi::{endpoints, Endpoint, ReqwestTransport};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), esapi::Error> {
//! let transport = Arc::new(ReqwestTransport::builder().base_url("http://localhost:9200")?.build()?);
//! let forcemerge = Endpoint::new(&endpoints::INDICES_FORCEMERGE, transport);
//!
//! let response = forcemerge
//!     .call([], [with_index(["logs-1", "logs-2"]), with_int("max_num_segments", 1), with_pretty()])
//!     .await?;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```

use crate::descriptor::{Descriptor, PathValue};
use crate::options::{self, RequestOption};
use crate::params::ParamSpec;
use crate::render::render;
use crate::transport::{Transport, TransportRequest};
use crate::{Error, Response, Result};
use bytes::Bytes;
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// One piece of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A literal segment such as `_forcemerge`.
    Lit(&'static str),
    /// A named parameter. Dropped, together with its separator, when empty.
    Param(&'static str),
}

/// Whether an endpoint takes a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// The endpoint never takes a body.
    None,
    /// A body may be set with [`with_body`](crate::options::with_body).
    Optional,
    /// The body is the last positional argument.
    Required,
}

/// The declarative description of one API operation.
#[derive(Debug)]
pub struct EndpointSpec {
    /// Dotted operation name, used in logs and errors.
    pub name: &'static str,
    /// The HTTP method. Fixed per endpoint.
    pub method: Method,
    /// The path template.
    pub path: &'static [Segment],
    /// Path parameters supplied positionally, in order.
    pub required: &'static [&'static str],
    /// Body handling.
    pub body: BodyRule,
    /// Endpoint-specific query parameters. The common parameters (`pretty`,
    /// `human`, `error_trace`, `filter_path`) are accepted everywhere.
    pub params: &'static [ParamSpec],
}

impl EndpointSpec {
    fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    fn has_path_param(&self, name: &str) -> bool {
        self.path
            .iter()
            .any(|s| matches!(s, Segment::Param(p) if *p == name))
    }

    fn arity(&self) -> usize {
        self.required.len() + usize::from(self.body == BodyRule::Required)
    }

    fn describe_arguments(&self) -> String {
        let mut names: Vec<&str> = self.required.to_vec();
        if self.body == BodyRule::Required {
            names.push("body");
        }
        if names.is_empty() {
            "no arguments".to_string()
        } else {
            format!("({})", names.join(", "))
        }
    }

    /// Checks a descriptor against this endpoint's legal option set.
    fn check(&self, descriptor: &Descriptor) -> Result<()> {
        for (name, value) in descriptor.params() {
            match self.param(name) {
                Some(spec) if spec.kind.accepts(value) => {}
                Some(spec) => {
                    return Err(self.unsupported(
                        name,
                        format!("expected a {:?} value, got {:?}", spec.kind, value.kind()),
                    ))
                }
                None => return Err(self.unsupported(name, "unknown parameter".to_string())),
            }
        }
        for (name, _) in descriptor.path_params() {
            if !self.has_path_param(name) {
                return Err(self.unsupported(name, "not a path parameter".to_string()));
            }
        }
        if self.body == BodyRule::None && descriptor.body().is_some() {
            return Err(self.unsupported("body", "endpoint takes no body".to_string()));
        }
        Ok(())
    }

    fn unsupported(&self, param: &str, reason: String) -> Error {
        Error::UnsupportedParameter {
            endpoint: self.name,
            param: param.to_string(),
            reason,
        }
    }
}

/// A required positional argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A path parameter.
    Path(PathValue),
    /// The request body.
    Body(Bytes),
}

impl Arg {
    /// A body argument from raw bytes.
    pub fn body(body: impl Into<Bytes>) -> Self {
        Arg::Body(body.into())
    }

    /// A body argument serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_vec(value)
            .map(|v| Arg::Body(v.into()))
            .map_err(|e| Error::SerializationFailed(e.to_string()))
    }

    fn describe(&self) -> &'static str {
        match self {
            Arg::Path(_) => "path",
            Arg::Body(_) => "body",
        }
    }
}

impl From<PathValue> for Arg {
    fn from(value: PathValue) -> Self {
        Arg::Path(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Path(value.into())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Path(value.into())
    }
}

impl From<Vec<String>> for Arg {
    fn from(value: Vec<String>) -> Self {
        Arg::Path(value.into())
    }
}

impl From<Vec<&str>> for Arg {
    fn from(value: Vec<&str>) -> Self {
        Arg::Path(value.into())
    }
}

impl<const N: usize> From<[&str; N]> for Arg {
    fn from(value: [&str; N]) -> Self {
        Arg::Path(value.into())
    }
}

/// A callable API operation bound to a transport.
///
/// Endpoints are cheap to clone and hold no per-call state, so one instance
/// can serve concurrent calls.
#[derive(Clone)]
pub struct Endpoint {
    spec: &'static EndpointSpec,
    transport: Arc<dyn Transport>,
}

impl Endpoint {
    /// Binds `spec` to `transport`.
    pub fn new(spec: &'static EndpointSpec, transport: Arc<dyn Transport>) -> Self {
        Self { spec, transport }
    }

    /// The endpoint's description.
    pub fn spec(&self) -> &'static EndpointSpec {
        self.spec
    }

    /// Calls the endpoint.
    ///
    /// Any HTTP status the server returns comes back as `Ok(Response)`. Errors
    /// mean no response was obtained: bad arguments or options, a cancelled
    /// scope, or a transport failure.
    pub async fn call<A, O>(&self, args: A, options: O) -> Result<Response>
    where
        A: IntoIterator<Item = Arg>,
        O: IntoIterator<Item = RequestOption>,
    {
        let request = self.prepare(args, options)?;

        if let Some(scope) = &request.scope {
            scope.check()?;
        }

        tracing::debug!(
            endpoint = self.spec.name,
            method = %request.method,
            path = %request.path,
            query = %request.query,
            "Dispatching request"
        );

        let start = Instant::now();
        match self.transport.perform(request).await {
            Ok(raw) => {
                let response = Response::from(raw);
                tracing::info!(
                    endpoint = self.spec.name,
                    status = response.status.as_u16(),
                    latency_ms = start.elapsed().as_millis(),
                    "Received response"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = self.spec.name,
                    error = %e,
                    latency_ms = start.elapsed().as_millis(),
                    "Request failed"
                );
                Err(e)
            }
        }
    }

    /// Builds the request `call` would send, without sending it.
    pub fn prepare<A, O>(&self, args: A, options: O) -> Result<TransportRequest>
    where
        A: IntoIterator<Item = Arg>,
        O: IntoIterator<Item = RequestOption>,
    {
        let descriptor = self.descriptor(args)?;
        let mut descriptor = options::apply(descriptor, options);
        if let Some(e) = descriptor.take_deferred_error() {
            return Err(e);
        }
        self.spec.check(&descriptor)?;
        render(self.spec, &descriptor).into_transport_request(descriptor)
    }

    fn descriptor<A>(&self, args: A) -> Result<Descriptor>
    where
        A: IntoIterator<Item = Arg>,
    {
        let args: Vec<Arg> = args.into_iter().collect();
        if args.len() != self.spec.arity() {
            return Err(self.invalid_arguments(&args));
        }

        let mut descriptor = Descriptor::new();
        let mut args = args.into_iter();
        for name in self.spec.required {
            match args.next() {
                Some(Arg::Path(value)) => descriptor.set_path(*name, value),
                _ => return Err(self.invalid_arguments_from(name)),
            }
        }
        if self.spec.body == BodyRule::Required {
            match args.next() {
                Some(Arg::Body(body)) => descriptor.set_body(body),
                _ => return Err(self.invalid_arguments_from("body")),
            }
        }
        Ok(descriptor)
    }

    fn invalid_arguments(&self, args: &[Arg]) -> Error {
        let got = if args.is_empty() {
            "no arguments".to_string()
        } else {
            format!(
                "({})",
                args.iter().map(Arg::describe).collect::<Vec<_>>().join(", ")
            )
        };
        Error::InvalidArguments {
            endpoint: self.spec.name,
            expected: self.spec.describe_arguments(),
            got,
        }
    }

    fn invalid_arguments_from(&self, position: &str) -> Error {
        Error::InvalidArguments {
            endpoint: self.spec.name,
            expected: self.spec.describe_arguments(),
            got: format!("wrong argument kind for `{}`", position),
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.spec.name)
            .field("method", &self.spec.method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints;
    use crate::options::*;
    use crate::response::Body;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn perform(&self, _request: TransportRequest) -> Result<http::Response<Body>> {
            panic!("transport must not be called");
        }
    }

    fn endpoint(spec: &'static EndpointSpec) -> Endpoint {
        Endpoint::new(spec, Arc::new(Unreachable))
    }

    #[test]
    fn test_required_arguments_fill_path() {
        let request = endpoint(&endpoints::GET)
            .prepare([Arg::from("books"), Arg::from("1")], [])
            .unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/books/_doc/1");
    }

    #[test]
    fn test_document_id_is_escaped_in_url() {
        let request = endpoint(&endpoints::GET)
            .prepare([Arg::from("books"), Arg::from("a%2Fb")], [])
            .unwrap();
        let url = request.url(&url::Url::parse("http://localhost:9200").unwrap());
        assert_eq!(url.as_str(), "http://localhost:9200/books/_doc/a%252Fb");

        let request = endpoint(&endpoints::GET)
            .prepare([Arg::from("books"), Arg::from("50%off/x")], [])
            .unwrap();
        assert_eq!(request.path, "/books/_doc/50%25off%2Fx");
    }

    #[test]
    fn test_required_body_argument() {
        let request = endpoint(&endpoints::INDEX)
            .prepare(
                [Arg::from("books"), Arg::json(&serde_json::json!({"title": "Dune"})).unwrap()],
                [with_document_id("1"), with_str("refresh", "wait_for")],
            )
            .unwrap();
        assert_eq!(request.path, "/books/_doc/1");
        assert_eq!(request.query, "refresh=wait_for");
        assert_eq!(request.body.as_deref(), Some(&br#"{"title":"Dune"}"#[..]));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = endpoint(&endpoints::GET)
            .prepare([Arg::from("books")], [])
            .unwrap_err();
        match err {
            Error::InvalidArguments { endpoint, expected, got } => {
                assert_eq!(endpoint, "get");
                assert_eq!(expected, "(index, id)");
                assert_eq!(got, "(path)");
            }
            other => panic!("Expected InvalidArguments, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_argument_kind() {
        let err = endpoint(&endpoints::INDEX)
            .prepare([Arg::from("books"), Arg::from("not-a-body")], [])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let err = endpoint(&endpoints::INFO)
            .prepare([], [with_int("max_num_segments", 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedParameter { endpoint: "info", ref param, .. } if param == "max_num_segments"
        ));
    }

    #[test]
    fn test_wrong_parameter_kind_is_rejected() {
        let err = endpoint(&endpoints::INDICES_FORCEMERGE)
            .prepare([], [with_str("max_num_segments", "five")])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedParameter { .. }));
    }

    #[test]
    fn test_body_on_bodyless_endpoint_is_rejected() {
        let err = endpoint(&endpoints::CLUSTER_HEALTH)
            .prepare([], [with_body("{}")])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedParameter { .. }));
    }

    #[test]
    fn test_unknown_path_parameter_is_rejected() {
        let err = endpoint(&endpoints::INFO)
            .prepare([], [with_index(["a"])])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedParameter { .. }));
    }

    #[test]
    fn test_common_options_are_always_accepted() {
        let request = endpoint(&endpoints::INFO)
            .prepare([], [with_pretty(), with_human(), with_error_trace(), with_filter_path(["name"])])
            .unwrap();
        assert_eq!(request.query, "error_trace=true&filter_path=name&human=true&pretty=true");
    }

    #[test]
    fn test_serialization_failure_surfaces() {
        let mut bad = std::collections::BTreeMap::new();
        bad.insert((1, 2), "tuple keys are not strings");
        let err = endpoint(&endpoints::SEARCH)
            .prepare([], [with_json_body(&bad)])
            .unwrap_err();
        assert!(matches!(err, Error::SerializationFailed(_)));
    }

    #[tokio::test]
    async fn test_cancelled_scope_never_reaches_transport() {
        let scope = crate::CancelScope::new();
        scope.cancel();
        let err = endpoint(&endpoints::INFO)
            .call([], [with_context(scope)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
