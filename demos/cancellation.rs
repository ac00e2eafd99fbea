//! Bounds a slow call with a cancellation scope.
//!
//! Run with: `cargo run --example cancellation`

use esapi::options::{with_context, with_duration, with_str};
use esapi::{endpoints, CancelScope, Endpoint, Error, ReqwestTransport};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("esapi=debug,cancellation=info")
        .init();

    let transport = Arc::new(
        ReqwestTransport::builder()
            .base_url("http://localhost:9200")?
            .build()?,
    );
    let health = Endpoint::new(&endpoints::CLUSTER_HEALTH, transport);

    // Ask the cluster to wait up to 30s for green, but give up after 2s.
    let session = CancelScope::new();
    let scope = session.child().with_timeout(Duration::from_secs(2));

    let result = health
        .call(
            [],
            [
                with_str("wait_for_status", "green"),
                with_duration("timeout", Duration::from_secs(30)),
                with_context(scope),
            ],
        )
        .await;

    match result {
        Ok(response) => println!("{}", response),
        Err(e) if e.is_cancellation() => println!("Gave up waiting: {}", e),
        Err(e) => return Err(e),
    }

    // Cancelling the session cancels every scope derived from it.
    session.cancel();
    let result = health
        .call([], [with_context(session.child())])
        .await;
    println!("After cancel: {:?}", result.map(|r| r.status));

    Ok(())
}
