//! Option functions: named mutators applied to a [`Descriptor`] before
//! dispatch.
//!
//! Options are applied strictly in the order given. When two options touch the
//! same field the later one wins, with one exception: [`with_header`] is
//! additive, so repeated header options accumulate values per header name.
//!
//! ```
//! use esapi::options::{self, with_filter_path, with_header, with_pretty};
//! use esapi::Descriptor;
//!
//! let d = options::apply(
//!     Descriptor::new(),
//!     [
//!         with_filter_path(["hits.hits._id"]),
//!         with_filter_path(["took"]),
//!         with_header([("X", "1")]),
//!         with_header([("X", "2")]),
//!         with_pretty(),
//!     ],
//! );
//! assert_eq!(d.filter_path(), ["took"]);
//! assert_eq!(d.headers().len(), 2);
//! ```

use crate::descriptor::{Descriptor, PathValue};
use crate::params::{ParamValue, TimeValue};
use crate::scope::CancelScope;
use crate::Error;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A single mutation of a [`Descriptor`].
pub struct RequestOption {
    name: &'static str,
    apply: Box<dyn FnOnce(&mut Descriptor) + Send>,
}

impl RequestOption {
    /// Creates an option from a closure. `name` is used in logs.
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: FnOnce(&mut Descriptor) + Send + 'static,
    {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    /// The option's name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOption").field("name", &self.name).finish()
    }
}

/// Applies `options` to `descriptor` in order.
pub fn apply<I>(mut descriptor: Descriptor, options: I) -> Descriptor
where
    I: IntoIterator<Item = RequestOption>,
{
    for option in options {
        tracing::trace!(option = option.name, "Applying request option");
        (option.apply)(&mut descriptor);
    }
    descriptor
}

/// Attaches a cancellation scope to the call.
pub fn with_context(scope: CancelScope) -> RequestOption {
    RequestOption::new("context", move |d| d.set_scope(scope))
}

/// Requests pretty-printed response bodies.
pub fn with_pretty() -> RequestOption {
    RequestOption::new("pretty", |d| d.set_pretty(true))
}

/// Requests human-readable numbers and units.
pub fn with_human() -> RequestOption {
    RequestOption::new("human", |d| d.set_human(true))
}

/// Requests server-side stack traces on errors.
pub fn with_error_trace() -> RequestOption {
    RequestOption::new("error_trace", |d| d.set_error_trace(true))
}

/// Restricts the fields returned in the response body.
pub fn with_filter_path<I, S>(paths: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
    RequestOption::new("filter_path", move |d| d.set_filter_path(paths))
}

/// Adds request headers.
///
/// The entries are copied when the option is created, so the caller's map is
/// never shared with the call. Values are appended to any values already set
/// for the same header by earlier options.
pub fn with_header<I, K, V>(headers: I) -> RequestOption
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let headers: Vec<(String, String)> = headers
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    RequestOption::new("header", move |d| {
        for (name, value) in headers {
            d.add_header(name, value);
        }
    })
}

/// Sets the `X-Opaque-Id` header used to trace requests in server logs and
/// task listings.
pub fn with_opaque_id(id: impl Into<String>) -> RequestOption {
    let id: String = id.into();
    RequestOption::new("opaque_id", move |d| d.set_opaque_id(id))
}

/// Sets the request body. The bytes are sent unmodified.
pub fn with_body(body: impl Into<Bytes>) -> RequestOption {
    let body: Bytes = body.into();
    RequestOption::new("body", move |d| d.set_body(body))
}

/// Serializes `value` as JSON and sets it as the request body.
///
/// A serialization failure is reported by the call as
/// [`Error::SerializationFailed`] before anything is sent.
pub fn with_json_body<T: Serialize + ?Sized>(value: &T) -> RequestOption {
    let encoded = serde_json::to_vec(value).map_err(|e| e.to_string());
    RequestOption::new("body", move |d| match encoded {
        Ok(body) => d.set_body(body),
        Err(e) => d.defer_error(Error::SerializationFailed(e)),
    })
}

/// Sets an optional path parameter.
pub fn with_path(name: &'static str, value: impl Into<PathValue>) -> RequestOption {
    let value: PathValue = value.into();
    RequestOption::new("path", move |d| d.set_path(name, value))
}

/// Sets the `index` path parameter.
pub fn with_index<I, S>(indices: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let indices: Vec<String> = indices.into_iter().map(Into::into).collect();
    with_path("index", indices)
}

/// Sets the `id` path parameter.
pub fn with_document_id(id: impl Into<String>) -> RequestOption {
    let id: String = id.into();
    with_path("id", id)
}

/// Sets a query parameter to an arbitrary value.
pub fn with_param(name: &'static str, value: ParamValue) -> RequestOption {
    RequestOption::new("param", move |d| d.set_param(name, value))
}

/// Sets a boolean query parameter.
pub fn with_bool(name: &'static str, value: bool) -> RequestOption {
    with_param(name, ParamValue::Bool(value))
}

/// Sets an integer query parameter.
pub fn with_int(name: &'static str, value: i64) -> RequestOption {
    with_param(name, ParamValue::Int(value))
}

/// Sets a time-unit query parameter such as `timeout`.
pub fn with_duration(name: &'static str, value: Duration) -> RequestOption {
    with_param(name, ParamValue::Duration(value))
}

/// Sets a string query parameter.
pub fn with_str(name: &'static str, value: impl Into<String>) -> RequestOption {
    with_param(name, ParamValue::Str(value.into()))
}

/// Sets a list query parameter.
pub fn with_list<I, S>(name: &'static str, values: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    with_param(
        name,
        ParamValue::List(values.into_iter().map(Into::into).collect()),
    )
}

/// Sets a parameter that takes a timestamp or a date-math expression.
pub fn with_time(name: &'static str, value: TimeValue) -> RequestOption {
    with_param(name, ParamValue::Time(value))
}

/// `timeout` shorthand.
pub fn with_timeout(timeout: Duration) -> RequestOption {
    with_duration("timeout", timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_last_write_wins() {
        let d = apply(
            Descriptor::new(),
            [with_int("max_num_segments", 1), with_int("max_num_segments", 5)],
        );
        assert_eq!(d.param("max_num_segments"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_order_is_preserved_for_reversed_input() {
        let d = apply(
            Descriptor::new(),
            [with_int("max_num_segments", 5), with_int("max_num_segments", 1)],
        );
        assert_eq!(d.param("max_num_segments"), Some(&ParamValue::Int(1)));
    }

    #[test]
    fn test_disjoint_options_commute() {
        let a = apply(Descriptor::new(), [with_pretty(), with_bool("flush", false)]);
        let b = apply(Descriptor::new(), [with_bool("flush", false), with_pretty()]);
        assert_eq!(a.pretty(), b.pretty());
        assert_eq!(a.param("flush"), b.param("flush"));
    }

    #[test]
    fn test_header_merge_is_additive() {
        let d = apply(
            Descriptor::new(),
            [with_header([("X", "1")]), with_header([("X", "2")])],
        );
        let values: Vec<&str> = d
            .headers()
            .iter()
            .filter(|(k, _)| k == "X")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(values, ["1", "2"]);
    }

    #[test]
    fn test_header_map_is_copied() {
        let mut caller_map = BTreeMap::new();
        caller_map.insert("X-Team".to_string(), "search".to_string());
        let option = with_header(caller_map.clone());
        caller_map.insert("X-Late".to_string(), "ignored".to_string());

        let d = apply(Descriptor::new(), [option]);
        assert_eq!(d.headers().len(), 1);
        assert_eq!(caller_map.len(), 2);
    }

    #[test]
    fn test_json_body_serializes() {
        let d = apply(
            Descriptor::new(),
            [with_json_body(&serde_json::json!({"query": {"match_all": {}}}))],
        );
        assert_eq!(
            d.body().map(|b| b.as_ref()),
            Some(&br#"{"query":{"match_all":{}}}"#[..])
        );
    }

    #[test]
    fn test_json_body_failure_is_deferred() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], "non-string key");
        let mut d = apply(Descriptor::new(), [with_json_body(&bad)]);
        assert!(d.body().is_none());
        assert!(matches!(
            d.take_deferred_error(),
            Some(Error::SerializationFailed(_))
        ));
    }

    #[test]
    fn test_index_shorthand() {
        let d = apply(Descriptor::new(), [with_index(["a", "b"])]);
        assert_eq!(
            d.path_param("index"),
            Some(&PathValue::Many(vec!["a".into(), "b".into()]))
        );
    }
}
