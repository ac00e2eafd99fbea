//! Rendering a descriptor into a wire-level request.
//!
//! Rendering is deterministic: the same descriptor always yields byte-identical
//! path and query strings. Query keys are sorted, and values that carry nothing
//! (unset options, zero durations, empty strings or lists) are left out.

use crate::descriptor::Descriptor;
use crate::endpoint::{EndpointSpec, Segment};
use crate::transport::TransportRequest;
use crate::{Error, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::BTreeMap;
use url::form_urlencoded;

// Path segment set from the URL standard, plus `%`. Commas stay literal since
// the server splits multi-valued segments on them.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

const CONTENT_TYPE_JSON: &str = "application/json";
const OPAQUE_ID: &str = "x-opaque-id";

/// The rendered method, path and query of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The endpoint's fixed method.
    pub method: Method,
    /// The URL path, starting with `/`.
    pub path: String,
    /// The encoded query string.
    pub query: String,
}

/// Renders `descriptor` against the path template and method of `spec`.
///
/// ```
/// use esapi::{endpoints, options, render, Descriptor};
///
/// let d = options::apply(
///     Descriptor::new(),
///     [options::with_index(["a", "b"]), options::with_int("max_num_segments", 5)],
/// );
/// let rendered = render::render(&endpoints::INDICES_FORCEMERGE, &d);
/// assert_eq!(rendered.path, "/a,b/_forcemerge");
/// assert_eq!(rendered.query, "max_num_segments=5");
/// ```
pub fn render(spec: &EndpointSpec, descriptor: &Descriptor) -> Rendered {
    Rendered {
        method: spec.method.clone(),
        path: render_path(spec.path, descriptor),
        query: render_query(descriptor),
    }
}

/// Joins the template's segments with `/`, dropping parameter segments that
/// have no value.
///
/// Parameter values are percent-encoded item by item, so a `/` or `%` inside
/// an id stays part of that id. List items are joined with a literal `,`.
pub fn render_path(template: &[Segment], descriptor: &Descriptor) -> String {
    let mut path = String::new();
    for segment in template {
        match segment {
            Segment::Lit(lit) => {
                path.push('/');
                path.push_str(lit);
            }
            Segment::Param(name) => {
                let items: Vec<String> = descriptor
                    .path_param(name)
                    .map(|v| {
                        v.items()
                            .map(|item| utf8_percent_encode(item, PATH_SEGMENT).to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                if !items.is_empty() {
                    path.push('/');
                    path.push_str(&items.join(","));
                }
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// Encodes the descriptor's query parameters, sorted by key.
pub fn render_query(descriptor: &Descriptor) -> String {
    let mut pairs: BTreeMap<&str, String> = descriptor
        .params()
        .filter_map(|(name, value)| value.render().map(|v| (name, v)))
        .collect();

    if descriptor.pretty() {
        pairs.insert("pretty", "true".to_string());
    }
    if descriptor.human() {
        pairs.insert("human", "true".to_string());
    }
    if descriptor.error_trace() {
        pairs.insert("error_trace", "true".to_string());
    }
    if !descriptor.filter_path().is_empty() {
        pairs.insert("filter_path", descriptor.filter_path().join(","));
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in &pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

impl Rendered {
    /// Attaches the descriptor's headers, body and scope, producing the
    /// request handed to the transport.
    ///
    /// Headers from options are appended in the order they were added, then
    /// `X-Opaque-Id` is set. A body without an explicit content type gets
    /// `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a header name or value from an
    /// option is not valid HTTP.
    pub fn into_transport_request(self, descriptor: Descriptor) -> Result<TransportRequest> {
        let Descriptor {
            headers: extra,
            opaque_id,
            body,
            scope,
            ..
        } = descriptor;

        let mut headers = HeaderMap::new();
        for (name, value) in extra {
            headers.append(parse_name(&name)?, parse_value(&name, &value)?);
        }

        if let Some(id) = opaque_id.filter(|id| !id.is_empty()) {
            headers.insert(HeaderName::from_static(OPAQUE_ID), parse_value(OPAQUE_ID, &id)?);
        }

        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        }

        Ok(TransportRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            headers,
            body,
            scope,
        })
    }
}

fn parse_name(name: &str) -> Result<HeaderName> {
    HeaderName::try_from(name)
        .map_err(|e| Error::InvalidHeader(format!("Invalid header name {:?}: {}", name, e)))
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::try_from(value)
        .map_err(|e| Error::InvalidHeader(format!("Invalid value for header {:?}: {}", name, e)))
}
