//! # esapi - request construction and dispatch for search cluster REST APIs
//!
//! Every API operation follows the same shape: a URL path built from a
//! template, a handful of query parameters, an optional JSON body, and a call
//! through an HTTP transport. This crate implements that shape once. An
//! operation is an [`EndpointSpec`] (plain data), and [`Endpoint`] turns a spec
//! plus a [`Transport`] into something you can call.
//!
//! ## Quick Start
//!
//! ```no_run
//! use esapi::options::{with_duration, with_index, with_int, with_pretty};
//! use esapi::{endpoints, Arg, Endpoint, ReqwestTransport};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), esapi::Error> {
//!     let transport = Arc::new(
//!         ReqwestTransport::builder()
//!             .base_url("http://localhost:9200")?
//!             .timeout(Duration::from_secs(30))
//!             .build()?,
//!     );
//!
//!     // POST /logs-1,logs-2/_forcemerge?max_num_segments=1&pretty=true
//!     let forcemerge = Endpoint::new(&endpoints::INDICES_FORCEMERGE, transport.clone());
//!     let response = forcemerge
//!         .call([], [with_index(["logs-1", "logs-2"]), with_int("max_num_segments", 1), with_pretty()])
//!         .await?;
//!     println!("{}", response);
//!     println!("{}", response.body.text().await?);
//!
//!     // Required arguments are positional.
//!     let get = Endpoint::new(&endpoints::GET, transport);
//!     let response = get
//!         .call([Arg::from("books"), Arg::from("1")], [with_duration("timeout", Duration::from_secs(5))])
//!         .await;
//!     // `timeout` is not a parameter of `get`, so nothing was sent.
//!     assert!(response.is_err());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Behavior
//!
//! - **Options** apply in order; the last one to touch a field wins. Header
//!   options are the exception and accumulate values.
//! - **Paths** drop empty parameter segments along with their separator, so
//!   `/{index}/_forcemerge` without an index renders as `/_forcemerge`.
//! - **Query strings** are sorted by key and never contain parameters the
//!   caller did not set.
//! - **Statuses** are never errors. A 404 comes back as a [`Response`] with
//!   `status == 404`; only a failure to get any response is an [`Error`].
//! - **Cancellation** flows through a [`CancelScope`] attached with
//!   [`options::with_context`].

mod descriptor;
mod endpoint;
pub mod endpoints;
mod error;
pub mod options;
pub mod params;
pub mod render;
mod response;
pub mod scope;
pub mod transport;

pub use descriptor::{Descriptor, PathValue};
pub use endpoint::{Arg, BodyRule, Endpoint, EndpointSpec, Segment};
pub use error::{Error, Result};
pub use options::RequestOption;
pub use params::{ParamKind, ParamSpec, ParamValue, TimeValue};
pub use response::{Body, BodyStream, Response};
pub use scope::{CancelReason, CancelScope};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder, Transport, TransportRequest};
