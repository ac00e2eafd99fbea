//! Typed query parameter values and the rules for rendering them.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A query parameter value set by an option.
///
/// A parameter that was never set is simply absent from the descriptor, so an
/// explicit `Bool(false)` is still rendered as `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A time unit such as `timeout` or `master_timeout`.
    Duration(Duration),
    /// A single string.
    Str(String),
    /// A list of strings, rendered comma-separated.
    List(Vec<String>),
    /// A point in time or a relative time expression.
    Time(TimeValue),
}

/// A parameter that accepts either an absolute time or a date-math
/// expression, such as the `start`/`end` bounds of result queries.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValue {
    /// An absolute point in time, rendered as epoch milliseconds.
    Timestamp(SystemTime),
    /// A date-math expression like `now-1d`, rendered verbatim.
    Expression(String),
    /// A raw number, rendered in decimal.
    Number(i64),
}

impl TimeValue {
    fn render(&self) -> Option<String> {
        match self {
            TimeValue::Timestamp(t) => {
                // Saturates for times beyond the i64 millisecond range.
                let millis = match t.duration_since(UNIX_EPOCH) {
                    Ok(since) => i64::try_from(since.as_millis()).unwrap_or(i64::MAX),
                    Err(e) => i64::try_from(e.duration().as_millis())
                        .map(|ms| -ms)
                        .unwrap_or(i64::MIN),
                };
                Some(millis.to_string())
            }
            TimeValue::Expression(expr) if expr.is_empty() => None,
            TimeValue::Expression(expr) => Some(expr.clone()),
            TimeValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl ParamValue {
    /// Renders the value for the query string, or `None` when the value is the
    /// "nothing to send" form of its type: zero durations, empty strings and
    /// empty lists.
    ///
    /// ```
    /// use esapi::params::ParamValue;
    /// use std::time::Duration;
    ///
    /// assert_eq!(ParamValue::Bool(false).render().as_deref(), Some("false"));
    /// assert_eq!(ParamValue::Duration(Duration::from_secs(30)).render().as_deref(), Some("30000ms"));
    /// assert_eq!(ParamValue::Duration(Duration::ZERO).render(), None);
    /// assert_eq!(ParamValue::List(vec![]).render(), None);
    /// ```
    pub fn render(&self) -> Option<String> {
        match self {
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Int(n) => Some(n.to_string()),
            ParamValue::Duration(d) if d.is_zero() => None,
            ParamValue::Duration(d) => Some(format_duration(*d)),
            ParamValue::Str(s) if s.is_empty() => None,
            ParamValue::Str(s) => Some(s.clone()),
            ParamValue::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(String::as_str)
                    .filter(|s| !s.is_empty())
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    Some(items.join(","))
                }
            }
            ParamValue::Time(t) => t.render(),
        }
    }

    /// The kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Duration(_) => ParamKind::Duration,
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::List(_) => ParamKind::List,
            ParamValue::Time(_) => ParamKind::Time,
        }
    }
}

/// Formats a duration the way the server's time units expect it: whole
/// milliseconds, or nanoseconds below one millisecond.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        format!("{}nanos", d.as_nanos())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// The declared type of an endpoint parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// See [`ParamValue::Bool`].
    Bool,
    /// See [`ParamValue::Int`].
    Int,
    /// See [`ParamValue::Duration`].
    Duration,
    /// See [`ParamValue::Str`].
    Str,
    /// See [`ParamValue::List`].
    List,
    /// See [`ParamValue::Time`].
    Time,
}

impl ParamKind {
    /// Returns `true` if `value` may be set on a parameter of this kind.
    pub fn accepts(&self, value: &ParamValue) -> bool {
        *self == value.kind()
    }
}

/// One entry of an endpoint's legal parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Wire name of the parameter.
    pub name: &'static str,
    /// Accepted value kind.
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Declares a parameter.
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind }
    }
}
