use std::time::Duration;

use async_trait::async_trait;
use domain::printer::{NetworkTarget, PrinterTransport, TransportError, TransportKind, TransportState};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

/// Network printer: raw TCP socket or OS share path.
///
/// Nothing is held between payloads. Each socket send opens, writes and closes its own
/// connection; each share send is one whole-file write.
pub struct NetworkTransport {
    target: NetworkTarget,
    connect_timeout: Duration,
    state: TransportState,
}

impl NetworkTransport {
    pub fn new(target: NetworkTarget, connect_timeout: Duration) -> Self {
        Self {
            target,
            connect_timeout,
            state: TransportState::Closed,
        }
    }

    async fn send_to_socket(&self, host: &str, port: u16, payload: &[u8]) -> Result<(), TransportError> {
        let address = format!("{}:{}", host, port);
        debug!(%address, bytes = payload.len(), "Connecting to network printer");

        let mut stream =
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    return Err(TransportError::OpenFailed(format!(
                        "Cannot connect to {}: {}",
                        address, e
                    )));
                }
                Err(_) => {
                    return Err(TransportError::OpenFailed(format!(
                        "Connection to {} timed out",
                        address
                    )));
                }
            };

        let written = async {
            stream.write_all(payload).await?;
            stream.flush().await?;
            stream.shutdown().await
        }
        .await;

        written.map_err(|e| {
            error!(%address, error = %e, "Failed to write to network printer");
            TransportError::SendFailed(e.to_string())
        })
    }

    async fn send_to_share(&self, path: &std::path::Path, payload: &[u8]) -> Result<(), TransportError> {
        tokio::fs::write(path, payload).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write to printer share");
            TransportError::SendFailed(format!(
                "Cannot access printer share {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl PrinterTransport for NetworkTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        self.state = TransportState::Open;
        info!(target = %self.target, "Network printer ready");
        Ok(())
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.state.is_open() {
            return Err(TransportError::NotOpen);
        }

        match &self.target {
            NetworkTarget::Share(path) => self.send_to_share(path, payload).await,
            NetworkTarget::Socket { host, port } => self.send_to_socket(host, *port, payload).await,
        }
    }

    async fn close(&mut self) {
        self.state = TransportState::Closed;
    }
}
