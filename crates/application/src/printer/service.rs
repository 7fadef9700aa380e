use std::sync::Arc;

use domain::printer::{
    ConfigError, ConfigRepository, DeviceRegistry, NetworkSettings, PrintEncoder, PrinterConfig,
    SerialCandidate, SerialSettings, TransportKind, TransportState, UsbCandidate, UsbSettings,
};
use tracing::info;

use super::scheduler::{Enqueued, WriteScheduler};
use super::tester::{ConnectionTestError, ConnectionTester};

/// What the operator picked from the USB candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbSelection {
    Device(UsbSettings),
    /// The synthetic entry offered when no USB printer is attached
    NetworkFallback,
}

impl From<&UsbCandidate> for UsbSelection {
    fn from(candidate: &UsbCandidate) -> Self {
        if candidate.network_fallback {
            Self::NetworkFallback
        } else {
            Self::Device(UsbSettings {
                vendor_id: candidate.vendor_id,
                product_id: candidate.product_id,
            })
        }
    }
}

/// Entry point for every printer operation exposed to the outside
pub struct PrinterService {
    config: Arc<dyn ConfigRepository>,
    registry: Arc<dyn DeviceRegistry>,
    scheduler: WriteScheduler,
    tester: ConnectionTester,
}

impl PrinterService {
    pub fn new(
        config: Arc<dyn ConfigRepository>,
        registry: Arc<dyn DeviceRegistry>,
        scheduler: WriteScheduler,
        encoder: Arc<dyn PrintEncoder>,
    ) -> Self {
        let tester = ConnectionTester::new(config.clone(), scheduler.clone(), encoder);
        Self {
            config,
            registry,
            scheduler,
            tester,
        }
    }

    pub fn scheduler(&self) -> &WriteScheduler {
        &self.scheduler
    }

    pub async fn list_serial_candidates(&self) -> Vec<SerialCandidate> {
        self.registry.serial_candidates().await
    }

    pub async fn list_usb_candidates(&self) -> Vec<UsbCandidate> {
        self.registry.usb_candidates().await
    }

    pub async fn save_serial_config(&self, settings: SerialSettings) -> Result<(), ConfigError> {
        self.save(PrinterConfig::serial(settings)).await
    }

    pub async fn save_usb_config(&self, selection: UsbSelection) -> Result<(), ConfigError> {
        let config = match selection {
            UsbSelection::Device(settings) => PrinterConfig::usb(settings),
            UsbSelection::NetworkFallback => {
                PrinterConfig::network(NetworkSettings::shared_printer_fallback())
            }
        };
        self.save(config).await
    }

    pub async fn save_network_config(&self, settings: NetworkSettings) -> Result<(), ConfigError> {
        self.save(PrinterConfig::network(settings)).await
    }

    pub async fn current_config(&self) -> Option<PrinterConfig> {
        self.config.load().await
    }

    pub async fn test_connection(&self) -> Result<(), ConnectionTestError> {
        self.tester.test().await
    }

    /// Open the configured transport so raw writes can follow
    pub async fn connect(&self) -> Result<TransportKind, ConnectionTestError> {
        let config = self
            .current_config()
            .await
            .ok_or(ConnectionTestError::NotConfigured)?;
        let transport = config.transport()?;
        let kind = transport.kind();
        self.scheduler.activate(transport).await?;
        Ok(kind)
    }

    pub async fn disconnect(&self) {
        self.scheduler.deactivate().await;
    }

    /// Fire-and-forget write to the active transport
    pub fn submit_raw(&self, payload: impl Into<Vec<u8>>) -> Enqueued {
        self.scheduler.enqueue(payload)
    }

    pub async fn drained(&self) {
        self.scheduler.drained().await;
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    async fn save(&self, config: PrinterConfig) -> Result<(), ConfigError> {
        self.config.save(&config).await?;
        info!(kind = %config.kind(), "💾 Printer configuration saved");

        if self.scheduler.transport_state() != TransportState::Closed {
            info!("Printer configuration changed, releasing active transport");
            self.scheduler.deactivate().await;
        }
        Ok(())
    }
}
