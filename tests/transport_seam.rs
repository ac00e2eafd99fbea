//! Endpoint behavior against in-process transports.

use async_trait::async_trait;
use esapi::options::{with_context, with_header, with_index, with_int, with_opaque_id};
use esapi::{endpoints, Arg, Body, CancelScope, Endpoint, Error, Transport, TransportRequest};
use http::StatusCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every request and answers with a fixed status and body.
struct Recording {
    status: StatusCode,
    body: &'static str,
    seen: Mutex<Vec<TransportRequest>>,
}

impl Recording {
    fn new(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for Recording {
    async fn perform(&self, request: TransportRequest) -> esapi::Result<http::Response<Body>> {
        self.seen.lock().unwrap().push(request);
        let mut response = http::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert("content-type", "application/json".parse().unwrap());
        Ok(response)
    }
}

/// Fails every request without producing a response.
struct Refusing;

#[async_trait]
impl Transport for Refusing {
    async fn perform(&self, _request: TransportRequest) -> esapi::Result<http::Response<Body>> {
        Err(Error::transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

/// Never answers.
struct Hanging;

#[async_trait]
impl Transport for Hanging {
    async fn perform(&self, request: TransportRequest) -> esapi::Result<http::Response<Body>> {
        match request.scope {
            Some(scope) => Err(scope.cancelled().await.into()),
            None => std::future::pending().await,
        }
    }
}

#[tokio::test]
async fn test_transport_sees_rendered_request() {
    let transport = Recording::new(200, "{}");
    let forcemerge = Endpoint::new(&endpoints::INDICES_FORCEMERGE, transport.clone());

    forcemerge
        .call(
            [],
            [
                with_index(["a", "b"]),
                with_int("max_num_segments", 5),
                with_header([("X-Tag", "1")]),
                with_opaque_id("abc"),
            ],
        )
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, http::Method::POST);
    assert_eq!(request.path, "/a,b/_forcemerge");
    assert_eq!(request.query, "max_num_segments=5");
    assert_eq!(request.headers.get("x-tag").unwrap(), "1");
    assert_eq!(request.headers.get("x-opaque-id").unwrap(), "abc");
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_not_found_is_ok_with_body() {
    let transport = Recording::new(404, r#"{"found":false}"#);
    let get = Endpoint::new(&endpoints::GET, transport);

    let response = get
        .call([Arg::from("books"), Arg::from("42")], [])
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.is_error());
    assert_eq!(response.header("content-type"), Some("application/json"));
    let body: serde_json::Value = response.body.json().await.unwrap();
    assert_eq!(body["found"], false);
}

#[tokio::test]
async fn test_transport_failure_has_no_response() {
    let info = Endpoint::new(&endpoints::INFO, Arc::new(Refusing));

    match info.call([], []).await {
        Err(e) => {
            assert!(e.is_transport_failure());
            assert!(!e.is_cancellation());
        }
        Ok(response) => panic!("Expected an error, got {}", response),
    }
}

#[tokio::test]
async fn test_invalid_call_never_reaches_transport() {
    let transport = Recording::new(200, "{}");
    let get = Endpoint::new(&endpoints::GET, transport.clone());

    let result = get.call([Arg::from("books")], []).await;
    assert!(matches!(result, Err(Error::InvalidArguments { .. })));
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_hanging_transport() {
    let info = Endpoint::new(&endpoints::INFO, Arc::new(Hanging));
    let scope = CancelScope::new().with_timeout(Duration::from_secs(10));

    let result = info.call([], [with_context(scope)]).await;
    assert!(matches!(result, Err(Error::DeadlineExceeded)));
}

#[tokio::test]
async fn test_parent_cancel_reaches_child_scope() {
    let info = Endpoint::new(&endpoints::INFO, Arc::new(Hanging));
    let parent = CancelScope::new();
    let child = parent.child();

    let call = tokio::spawn({
        let info = info.clone();
        async move { info.call([], [with_context(child)]).await }
    });

    tokio::task::yield_now().await;
    parent.cancel();

    let result = call.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_concurrent_calls_do_not_share_state() {
    let transport = Recording::new(200, "{}");
    let search = Endpoint::new(&endpoints::SEARCH, transport.clone());

    let calls = (0..16).map(|i| {
        let search = search.clone();
        async move {
            search
                .call([], [with_index([format!("logs-{}", i)]), with_int("size", i)])
                .await
        }
    });
    for result in futures_join_all(calls).await {
        assert!(result.unwrap().status.is_success());
    }

    let mut seen: Vec<(String, String)> = transport
        .requests()
        .into_iter()
        .map(|r| (r.path, r.query))
        .collect();
    seen.sort();
    let mut expected: Vec<(String, String)> = (0..16)
        .map(|i| (format!("/logs-{}/_search", i), format!("size={}", i)))
        .collect();
    expected.sort();
    assert_eq!(seen, expected);
}

async fn futures_join_all<F, T>(futures: impl IntoIterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.into_iter().map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}
