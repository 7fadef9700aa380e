mod config;
mod device;
mod receipt;
mod repository;
mod transport;
mod transport_state;
mod usb_id;

pub use config::{
    DEFAULT_RAW_PORT, DataBits, NetworkSettings, NetworkTarget, Parity, PrinterConfig,
    SHARE_PATH_PREFIXES, SerialSettings, StopBits, TransportConfig, TransportKind, UsbSettings,
};
pub use device::{
    DeviceRegistry, KNOWN_PRINTER_VENDORS, NETWORK_FALLBACK_DESCRIPTION, SerialCandidate,
    UsbCandidate, UsbDescriptor, is_known_printer_vendor, usb_candidates_from,
};
pub use receipt::{Alignment, PrintDirective, PrintEncoder};
pub use repository::{ConfigError, ConfigRepository};
pub use transport::{PrinterTransport, TransportError, TransportFactory};
pub use transport_state::TransportState;
pub use usb_id::UsbId;
