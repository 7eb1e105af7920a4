//! Component seams sequenced by the [`Orchestrator`](crate::Orchestrator).

use std::error::Error;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Process-wide telemetry pipeline. Started once, before anything else, and drained first.
#[async_trait]
pub trait Telemetry: Send {
    type StartError: Error + Send + Sync + 'static;
    type FlushError: Error + Send + Sync + 'static;

    /// Installs the instrumentation hooks. Synchronous: configuration only, no suspension.
    fn start(&mut self) -> Result<(), Self::StartError>;

    /// Flushes buffered spans and metrics, then deactivates the hooks.
    async fn shutdown(&mut self) -> Result<(), Self::FlushError>;
}

/// Outbound message-publishing connection.
#[async_trait]
pub trait Publisher: Send {
    type ConnectError: Error + Send + Sync + 'static;
    type DisconnectError: Error + Send + Sync + 'static;

    /// Establishes the connection. No retries: a failure leaves the publisher unconnected.
    async fn start(&mut self) -> Result<(), Self::ConnectError>;

    /// Flushes in-flight publishes and releases the connection. A no-op when never
    /// connected or already closed.
    async fn shutdown(&mut self) -> Result<(), Self::DisconnectError>;
}

/// Request-accepting endpoint. It has no shutdown step of its own: it stops accepting once
/// `stop_accepting` is cancelled and is torn down with the process.
#[async_trait]
pub trait Listener: Send {
    type Error: Error + Send + Sync + 'static;

    /// Opens the endpoint and starts serving in the background, returning the bound address.
    async fn open(&mut self, stop_accepting: CancellationToken) -> Result<SocketAddr, Self::Error>;
}
