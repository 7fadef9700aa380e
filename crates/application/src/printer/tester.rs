use std::sync::Arc;

use chrono::Local;
use domain::DomainError;
use domain::printer::{
    ConfigRepository, PrintDirective, PrintEncoder, TransportError, TransportKind,
};
use thiserror::Error;
use tracing::{error, info};

use super::builder::ReceiptBuilder;
use super::scheduler::WriteScheduler;

#[derive(Debug, Error)]
pub enum ConnectionTestError {
    #[error("No printer configured")]
    NotConfigured,
    #[error("Invalid printer configuration: {0}")]
    InvalidConfiguration(#[from] DomainError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Diagnostic receipt printed by a connection test
pub fn diagnostic_receipt(kind: TransportKind, printed_at: &str) -> Vec<PrintDirective> {
    ReceiptBuilder::new()
        .initialize()
        .align_center()
        .bold(true)
        .line("TEST PRINT")
        .bold(false)
        .rule()
        .align_left()
        .line(format!("Date: {}", printed_at))
        .line(format!("Connection Type: {}", kind))
        .rule()
        .align_center()
        .line("If you can read this,")
        .line("printer is working correctly!")
        .newline()
        .newline()
        .cut()
        .build()
}

/// Prints a diagnostic receipt on the configured printer
pub struct ConnectionTester {
    config: Arc<dyn ConfigRepository>,
    scheduler: WriteScheduler,
    encoder: Arc<dyn PrintEncoder>,
}

impl ConnectionTester {
    pub fn new(
        config: Arc<dyn ConfigRepository>,
        scheduler: WriteScheduler,
        encoder: Arc<dyn PrintEncoder>,
    ) -> Self {
        Self {
            config,
            scheduler,
            encoder,
        }
    }

    pub async fn test(&self) -> Result<(), ConnectionTestError> {
        let config = self
            .config
            .load()
            .await
            .ok_or(ConnectionTestError::NotConfigured)?;
        let transport = config.transport()?;
        let kind = transport.kind();

        let printed_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let payload = self.encoder.encode(&diagnostic_receipt(kind, &printed_at));
        info!(transport = %transport, bytes = payload.len(), "Sending test print");

        self.scheduler.activate(transport).await?;
        let result = self.scheduler.submit(payload).await;

        // The USB interface is claimed exclusively; hand it back even after a failed transfer
        if kind == TransportKind::Usb {
            self.scheduler.deactivate().await;
        }

        match &result {
            Ok(()) => info!(%kind, "✅ Test print delivered"),
            Err(e) => error!(%kind, error = %e, "❌ Test print failed"),
        }
        result.map_err(ConnectionTestError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::builder::EscPosEncoder;
    use crate::printer::context::TransportContext;
    use async_trait::async_trait;
    use domain::printer::{
        ConfigError, PrinterConfig, SerialSettings, TransportState, UsbId, UsbSettings,
    };
    use infrastructure::{SimulatedHardware, WireEvent};
    use mockall::mock;

    mock! {
        pub Store {}

        #[async_trait]
        impl ConfigRepository for Store {
            async fn load(&self) -> Option<PrinterConfig>;
            async fn save(&self, config: &PrinterConfig) -> Result<(), ConfigError>;
        }
    }

    fn store_with(config: Option<PrinterConfig>) -> MockStore {
        let mut store = MockStore::new();
        store.expect_load().returning(move || config.clone());
        store
    }

    fn tester(store: MockStore, hardware: &SimulatedHardware) -> (ConnectionTester, WriteScheduler) {
        let context = TransportContext::new(Arc::new(hardware.clone()));
        let (scheduler, _) = WriteScheduler::spawn(context);
        let tester = ConnectionTester::new(
            Arc::new(store),
            scheduler.clone(),
            Arc::new(EscPosEncoder::default()),
        );
        (tester, scheduler)
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_diagnostic_receipt_layout() {
        let directives = diagnostic_receipt(TransportKind::Serial, "2024-01-01 12:00:00");
        assert_eq!(directives.first(), Some(&PrintDirective::Initialize));
        assert_eq!(directives.last(), Some(&PrintDirective::Cut));
        assert!(directives.contains(&PrintDirective::Line("TEST PRINT".to_string())));
        assert!(directives.contains(&PrintDirective::Line("Date: 2024-01-01 12:00:00".to_string())));
        assert!(directives.contains(&PrintDirective::Line("Connection Type: serial".to_string())));
    }

    #[tokio::test]
    async fn test_not_configured() {
        let hardware = SimulatedHardware::new();
        let (tester, _) = tester(store_with(None), &hardware);

        let result = tester.test().await;

        assert!(matches!(result, Err(ConnectionTestError::NotConfigured)));
        assert!(hardware.events().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_configuration() {
        let hardware = SimulatedHardware::new();
        let config: PrinterConfig = serde_json::from_str(r#"{"type":"usb"}"#).unwrap();
        let (tester, _) = tester(store_with(Some(config)), &hardware);

        let result = tester.test().await;

        assert!(matches!(result, Err(ConnectionTestError::InvalidConfiguration(_))));
        assert!(hardware.events().is_empty());
    }

    #[tokio::test]
    async fn test_serial_test_print_keeps_transport_open() {
        let hardware = SimulatedHardware::new();
        let config = PrinterConfig::serial(SerialSettings::new("COM3"));
        let (tester, scheduler) = tester(store_with(Some(config)), &hardware);

        tester.test().await.unwrap();

        let drained = hardware.drained_payloads();
        assert_eq!(drained.len(), 1);
        assert!(contains(&drained[0], b"TEST PRINT"));
        assert!(contains(&drained[0], b"Connection Type: serial"));
        assert_eq!(scheduler.transport_state(), TransportState::Open);
    }

    fn usb_config() -> PrinterConfig {
        PrinterConfig::usb(UsbSettings {
            vendor_id: UsbId::from(0x04b8),
            product_id: UsbId::from(0x0202),
        })
    }

    #[tokio::test]
    async fn test_usb_claim_released_after_test() {
        let hardware = SimulatedHardware::new();
        let (tester, scheduler) = tester(store_with(Some(usb_config())), &hardware);

        tester.test().await.unwrap();

        assert_eq!(scheduler.transport_state(), TransportState::Closed);
        assert_eq!(hardware.live_handles(), 0);
        assert_eq!(
            hardware.events().last(),
            Some(&WireEvent::Closed(TransportKind::Usb))
        );
    }

    #[tokio::test]
    async fn test_usb_claim_released_after_failed_transfer() {
        let hardware = SimulatedHardware::new();
        hardware.set_fail_sends(true);
        let (tester, scheduler) = tester(store_with(Some(usb_config())), &hardware);

        let result = tester.test().await;

        assert!(matches!(
            result,
            Err(ConnectionTestError::Transport(TransportError::SendFailed(_)))
        ));
        assert_eq!(scheduler.transport_state(), TransportState::Closed);
        assert_eq!(hardware.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_surfaces() {
        let hardware = SimulatedHardware::new();
        hardware.set_fail_open(true);
        let config = PrinterConfig::serial(SerialSettings::new("COM9"));
        let (tester, _) = tester(store_with(Some(config)), &hardware);

        let result = tester.test().await;

        assert!(matches!(
            result,
            Err(ConnectionTestError::Transport(TransportError::OpenFailed(_)))
        ));
        assert!(hardware.drained_payloads().is_empty());
    }
}
