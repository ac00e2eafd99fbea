//! The per-call request descriptor.

use crate::params::ParamValue;
use crate::scope::CancelScope;
use crate::Error;
use bytes::Bytes;
use std::collections::BTreeMap;

/// A path parameter: one string or a list of strings.
///
/// Lists are joined with `,` when interpolated. An empty string or an empty
/// list renders nothing, and the segment is dropped from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValue {
    /// A single value, such as a document id.
    One(String),
    /// Several values, such as a list of index names.
    Many(Vec<String>),
}

impl PathValue {
    /// The non-empty items of the value, in order.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            PathValue::One(s) => std::slice::from_ref(s),
            PathValue::Many(items) => items,
        };
        items.iter().map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Renders the segment unescaped, or `None` when no item is non-empty.
    pub fn render(&self) -> Option<String> {
        let items: Vec<&str> = self.items().collect();
        if items.is_empty() {
            None
        } else {
            Some(items.join(","))
        }
    }
}

impl From<&str> for PathValue {
    fn from(value: &str) -> Self {
        PathValue::One(value.to_string())
    }
}

impl From<String> for PathValue {
    fn from(value: String) -> Self {
        PathValue::One(value)
    }
}

impl From<Vec<String>> for PathValue {
    fn from(value: Vec<String>) -> Self {
        PathValue::Many(value)
    }
}

impl From<Vec<&str>> for PathValue {
    fn from(value: Vec<&str>) -> Self {
        PathValue::Many(value.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PathValue {
    fn from(value: [&str; N]) -> Self {
        PathValue::Many(value.into_iter().map(String::from).collect())
    }
}

/// Everything an endpoint call carries before it is rendered.
///
/// A descriptor is created fresh for every call, filled from the positional
/// arguments, mutated by [`RequestOption`](crate::RequestOption)s, then
/// borrowed by the renderer and consumed by dispatch.
#[derive(Debug, Default)]
pub struct Descriptor {
    pub(crate) path: BTreeMap<String, PathValue>,
    pub(crate) params: BTreeMap<String, ParamValue>,
    pub(crate) body: Option<Bytes>,
    pub(crate) pretty: bool,
    pub(crate) human: bool,
    pub(crate) error_trace: bool,
    pub(crate) filter_path: Vec<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) opaque_id: Option<String>,
    pub(crate) scope: Option<CancelScope>,
    pub(crate) deferred_error: Option<Error>,
}

impl Descriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path parameter, replacing any earlier value.
    pub fn set_path(&mut self, name: impl Into<String>, value: impl Into<PathValue>) {
        self.path.insert(name.into(), value.into());
    }

    /// Returns a path parameter.
    pub fn path_param(&self, name: &str) -> Option<&PathValue> {
        self.path.get(name)
    }

    /// Iterates over the path parameters by name.
    pub fn path_params(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.path.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets a query parameter, replacing any earlier value.
    pub fn set_param(&mut self, name: impl Into<String>, value: ParamValue) {
        self.params.insert(name.into(), value);
    }

    /// Returns a query parameter.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Iterates over the explicitly set query parameters, sorted by name.
    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Sets the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Returns the request body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Sets `pretty`.
    pub fn set_pretty(&mut self, pretty: bool) {
        self.pretty = pretty;
    }

    /// Returns `pretty`.
    pub fn pretty(&self) -> bool {
        self.pretty
    }

    /// Sets `human`.
    pub fn set_human(&mut self, human: bool) {
        self.human = human;
    }

    /// Returns `human`.
    pub fn human(&self) -> bool {
        self.human
    }

    /// Sets `error_trace`.
    pub fn set_error_trace(&mut self, error_trace: bool) {
        self.error_trace = error_trace;
    }

    /// Returns `error_trace`.
    pub fn error_trace(&self) -> bool {
        self.error_trace
    }

    /// Replaces the response filter paths.
    pub fn set_filter_path(&mut self, paths: Vec<String>) {
        self.filter_path = paths;
    }

    /// Returns the response filter paths.
    pub fn filter_path(&self) -> &[String] {
        &self.filter_path
    }

    /// Appends a header. Earlier values for the same name are kept.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Returns the extra headers in the order they were added.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Sets the `X-Opaque-Id` value.
    pub fn set_opaque_id(&mut self, id: impl Into<String>) {
        self.opaque_id = Some(id.into());
    }

    /// Returns the `X-Opaque-Id` value.
    pub fn opaque_id(&self) -> Option<&str> {
        self.opaque_id.as_deref()
    }

    /// Attaches a cancellation scope.
    pub fn set_scope(&mut self, scope: CancelScope) {
        self.scope = Some(scope);
    }

    /// Returns the cancellation scope.
    pub fn scope(&self) -> Option<&CancelScope> {
        self.scope.as_ref()
    }

    /// Records an error raised while applying an option. The call fails with
    /// the first recorded error before anything is dispatched.
    pub fn defer_error(&mut self, error: Error) {
        if self.deferred_error.is_none() {
            self.deferred_error = Some(error);
        }
    }

    pub(crate) fn take_deferred_error(&mut self) -> Option<Error> {
        self.deferred_error.take()
    }
}
