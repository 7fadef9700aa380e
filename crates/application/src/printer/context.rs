use std::sync::Arc;

use domain::printer::{
    PrinterTransport, TransportConfig, TransportError, TransportFactory, TransportState,
};
use tokio::sync::watch;
use tracing::{info, warn};

/// Owns the single active transport and publishes its state.
///
/// At most one transport is alive at a time: activating a new one closes the
/// previous handle before the new one is opened.
pub struct TransportContext {
    factory: Arc<dyn TransportFactory>,
    active: Option<Box<dyn PrinterTransport>>,
    state_tx: watch::Sender<TransportState>,
}

impl TransportContext {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        let (state_tx, _) = watch::channel(TransportState::Closed);
        Self {
            factory,
            active: None,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TransportState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> TransportState {
        *self.state_tx.borrow()
    }

    pub async fn activate(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        self.deactivate().await;

        let mut transport = self.factory.create(config);
        self.advance(TransportState::to_opening)?;
        info!(transport = %config, "🔌 Opening printer transport");

        let opened = transport
            .open()
            .await
            .and_then(|()| self.advance(TransportState::to_open));
        match opened {
            Ok(()) => {
                self.active = Some(transport);
                info!(kind = %config.kind(), "✅ Printer transport open");
                Ok(())
            }
            Err(e) => {
                warn!(transport = %config, error = %e, "❌ Failed to open printer transport");
                transport.close().await;
                self.publish(self.state().to_closed());
                Err(e)
            }
        }
    }

    pub async fn deactivate(&mut self) {
        if let Some(mut transport) = self.active.take() {
            info!(kind = %transport.kind(), "Closing printer transport");
            transport.close().await;
        }
        self.publish(self.state().to_closed());
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        match self.active.as_mut() {
            Some(transport) => transport.send(payload).await,
            None => Err(TransportError::NotOpen),
        }
    }

    /// Apply a checked transition to the published state
    fn advance(
        &self,
        transition: impl FnOnce(&TransportState) -> Result<TransportState, &'static str>,
    ) -> Result<(), TransportError> {
        let next = transition(&self.state()).map_err(|e| TransportError::OpenFailed(e.to_string()))?;
        self.publish(next);
        Ok(())
    }

    fn publish(&self, state: TransportState) {
        self.state_tx.send_replace(state);
    }
}
