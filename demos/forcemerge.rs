//! Force-merges a set of indices and prints the cluster's answer.
//!
//! Run with: `cargo run --example forcemerge -- http://localhost:9200 logs-1 logs-2`

use esapi::options::{with_bool, with_index, with_int, with_opaque_id, with_pretty};
use esapi::{endpoints, Endpoint, Error, ReqwestTransport};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("esapi=debug,forcemerge=info")
        .init();

    let mut args = std::env::args().skip(1);
    let base_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:9200".to_string());
    let indices: Vec<String> = args.collect();

    let transport = Arc::new(
        ReqwestTransport::builder()
            .base_url(&base_url)?
            .timeout(Duration::from_secs(60))
            .default_header("User-Agent", "esapi-forcemerge/0.1")?
            .build()?,
    );

    let forcemerge = Endpoint::new(&endpoints::INDICES_FORCEMERGE, transport);

    // An empty index list merges every index: POST /_forcemerge
    let response = forcemerge
        .call(
            [],
            [
                with_index(indices),
                with_int("max_num_segments", 1),
                with_bool("flush", true),
                with_opaque_id("forcemerge-demo"),
                with_pretty(),
            ],
        )
        .await?;

    if response.is_error() {
        tracing::warn!(status = response.status.as_u16(), "Cluster rejected the merge");
    }
    println!("{}", response);
    println!("{}", response.body.text().await?);

    Ok(())
}
