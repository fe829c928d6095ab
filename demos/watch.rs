//! Sentinel Watcher - print every sentinel notification as a JSON line.
//!
//! This example demonstrates:
//! - Connecting a `StreamTransport` over TCP
//! - Pattern-subscribing a session to all sentinel channels
//! - Driving the session with `listen()` and exporting events with `JsonCodec`
//! - Stopping cleanly on Ctrl-C through the transport's `CloseHandle`
//!
//! # Running
//!
//! ```text
//! SENTINEL_ADDR=127.0.0.1:26379 RUST_LOG=sentinel_pubsub=debug \
//!     cargo run --example watch -- '*'
//! ```

use std::io::Write;
use std::ops::ControlFlow;

use sentinel_pubsub::codec::JsonCodec;
use sentinel_pubsub::{Session, SentinelError, StreamTransport};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:26379";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries only JSON lines.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let addr = std::env::var("SENTINEL_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let pattern = std::env::args().nth(1).unwrap_or_else(|| "*".to_string());

    let transport = StreamTransport::connect_tcp(addr.as_str()).await?;
    let closer = transport.close_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            closer.close();
        }
    });

    let mut session = Session::builder().build(transport);
    session.psubscribe([pattern]).await?;

    let stdout = std::io::stdout();
    loop {
        let result = session
            .listen(|event| match JsonCodec::encode_line(&event) {
                Ok(line) => {
                    let mut out = stdout.lock();
                    if out.write_all(line.as_bytes()).and_then(|_| out.flush()).is_err() {
                        return ControlFlow::Break(());
                    }
                    ControlFlow::Continue(())
                }
                Err(e) => {
                    tracing::error!("Failed to encode event: {}", e);
                    ControlFlow::Continue(())
                }
            })
            .await;

        match result {
            // Bad payloads only cost one event.
            Err(e @ SentinelError::MalformedPayload { .. }) => {
                tracing::warn!("Skipping notification: {}", e);
            }
            Err(SentinelError::Closed) => break,
            Err(e) => return Err(e.into()),
            Ok(()) => break,
        }
    }

    session.disconnect().await?;
    Ok(())
}
