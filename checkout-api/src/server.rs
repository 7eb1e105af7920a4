use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("could not bind {bind}: {source}")]
    Bind { bind: String, source: io::Error },
    #[error("listener was already opened")]
    AlreadyOpen,
}

/// HTTP endpoint serving the assembled router. Opened once, after the publisher is
/// connected; stops accepting connections when draining begins and is otherwise torn down
/// with the process.
pub struct HttpListener {
    bind: String,
    app: Option<Router>,
}

impl HttpListener {
    pub fn new(bind: String, app: Router) -> Self {
        Self {
            bind,
            app: Some(app),
        }
    }
}

#[async_trait]
impl lifecycle::Listener for HttpListener {
    type Error = ListenError;

    async fn open(&mut self, stop_accepting: CancellationToken) -> Result<SocketAddr, ListenError> {
        let app = self.app.take().ok_or(ListenError::AlreadyOpen)?;

        // Open the TCP port and start the server
        let listener = TcpListener::bind(&self.bind)
            .await
            .map_err(|source| ListenError::Bind {
                bind: self.bind.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| ListenError::Bind {
            bind: self.bind.clone(),
            source,
        })?;

        tokio::spawn(async move {
            let server = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async move { stop_accepting.cancelled().await });
            match server.await {
                Ok(()) => info!("http server stopped accepting connections"),
                Err(e) => error!("http server failed: {}", e),
            }
        });

        Ok(addr)
    }
}
