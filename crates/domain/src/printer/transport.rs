use async_trait::async_trait;
use thiserror::Error;

use super::config::{TransportConfig, TransportKind};
use super::transport_state::TransportState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Open failed: {0}")]
    OpenFailed(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Transport not open")]
    NotOpen,
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("No bulk OUT endpoint on USB interface {0}")]
    NoOutEndpoint(u8),
    #[error("Unsupported setting: {0}")]
    Unsupported(String),
}

impl TransportError {
    /// Errors raised while acquiring the handle, as opposed to mid-transfer.
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed(_) | Self::DeviceNotFound(_) | Self::NoOutEndpoint(_) | Self::Unsupported(_)
        )
    }
}

/// A printer link of one kind: serial port, USB bulk endpoint or network target.
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    fn state(&self) -> TransportState;

    /// Acquire the underlying handle. Closes first if already open.
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Deliver the payload and return once it has drained from the local buffer.
    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Release the handle. A no-op when already closed.
    async fn close(&mut self);
}

/// Builds unopened transports for a configuration
pub trait TransportFactory: Send + Sync {
    fn create(&self, config: &TransportConfig) -> Box<dyn PrinterTransport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failures_are_distinct_from_send_failures() {
        assert!(TransportError::OpenFailed("busy".into()).is_open_failure());
        assert!(TransportError::DeviceNotFound("04b8:0202".into()).is_open_failure());
        assert!(TransportError::NoOutEndpoint(0).is_open_failure());
        assert!(!TransportError::SendFailed("unplugged".into()).is_open_failure());
        assert!(!TransportError::NotOpen.is_open_failure());
    }
}
