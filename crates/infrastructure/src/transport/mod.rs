mod network;
mod serial;
pub mod simulated;
mod usb;

pub use network::NetworkTransport;
pub use serial::SerialTransport;
pub use simulated::{SimulatedHardware, SimulatedTransport, WireEvent};
pub use usb::UsbTransport;

use async_trait::async_trait;
use domain::printer::{
    PrinterTransport, TransportConfig, TransportError, TransportFactory, TransportKind,
    TransportState,
};

use crate::settings::TransportSettings;

/// One concrete printer link. The set of kinds is closed.
pub enum Transport {
    Serial(SerialTransport),
    Usb(UsbTransport),
    Network(NetworkTransport),
}

impl Transport {
    pub fn from_config(config: &TransportConfig, settings: &TransportSettings) -> Self {
        match config {
            TransportConfig::Serial(serial) => Self::Serial(SerialTransport::new(
                serial.clone(),
                settings.serial_timeout(),
            )),
            TransportConfig::Usb(usb) => Self::Usb(UsbTransport::new(*usb, settings.usb_timeout())),
            TransportConfig::Network(target) => Self::Network(NetworkTransport::new(
                target.clone(),
                settings.network_connect_timeout(),
            )),
        }
    }
}

#[async_trait]
impl PrinterTransport for Transport {
    fn kind(&self) -> TransportKind {
        match self {
            Self::Serial(t) => t.kind(),
            Self::Usb(t) => t.kind(),
            Self::Network(t) => t.kind(),
        }
    }

    fn state(&self) -> TransportState {
        match self {
            Self::Serial(t) => t.state(),
            Self::Usb(t) => t.state(),
            Self::Network(t) => t.state(),
        }
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Serial(t) => t.open().await,
            Self::Usb(t) => t.open().await,
            Self::Network(t) => t.open().await,
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        match self {
            Self::Serial(t) => t.send(payload).await,
            Self::Usb(t) => t.send(payload).await,
            Self::Network(t) => t.send(payload).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Serial(t) => t.close().await,
            Self::Usb(t) => t.close().await,
            Self::Network(t) => t.close().await,
        }
    }
}

/// Factory for real hardware transports
#[derive(Debug, Clone, Default)]
pub struct HardwareTransportFactory {
    settings: TransportSettings,
}

impl HardwareTransportFactory {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }
}

impl TransportFactory for HardwareTransportFactory {
    fn create(&self, config: &TransportConfig) -> Box<dyn PrinterTransport> {
        Box::new(Transport::from_config(config, &self.settings))
    }
}
