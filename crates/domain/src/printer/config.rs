use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::usb_id::UsbId;
use crate::error::{DomainError, Result};

/// Address prefixes that mark a network printer as an OS file share
/// (`\\server\printer` on Windows, `//server/printer` once mounted elsewhere).
pub const SHARE_PATH_PREFIXES: [&str; 2] = [r"\\", "//"];

/// Raw TCP port used by most receipt printers (JetDirect / AppSocket).
pub const DEFAULT_RAW_PORT: u16 = 9100;

/// Kind of link the printer is reachable over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Serial,
    Usb,
    Network,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Usb => "usb",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl TryFrom<u8> for DataBits {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(DomainError::InvalidSerialSetting(format!(
                "Invalid data bits: {other}"
            ))),
        }
    }
}

impl From<DataBits> for u8 {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    #[serde(alias = "None")]
    None,
    #[serde(alias = "Even")]
    Even,
    #[serde(alias = "Odd")]
    Odd,
}

/// Stop bits; persisted as the numbers `1`, `1.5` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl TryFrom<f64> for StopBits {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self> {
        if value == 1.0 {
            Ok(Self::One)
        } else if value == 1.5 {
            Ok(Self::OnePointFive)
        } else if value == 2.0 {
            Ok(Self::Two)
        } else {
            Err(DomainError::InvalidSerialSetting(format!(
                "Invalid stop bits: {value}"
            )))
        }
    }
}

impl Serialize for StopBits {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::One => serializer.serialize_u8(1),
            Self::OnePointFive => serializer.serialize_f64(1.5),
            Self::Two => serializer.serialize_u8(2),
        }
    }
}

impl<'de> Deserialize<'de> for StopBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialSettings {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default)]
    pub data_bits: DataBits,
    #[serde(default)]
    pub parity: Parity,
    #[serde(default)]
    pub stop_bits: StopBits,
}

fn default_baud_rate() -> u32 {
    9600
}

impl SerialSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "Serial port cannot be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(DomainError::InvalidConfiguration(
                "Baud rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsbSettings {
    pub vendor_id: UsbId,
    pub product_id: UsbId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub address: String,
    #[serde(default = "default_network_port")]
    pub port: u16,
}

fn default_network_port() -> u16 {
    DEFAULT_RAW_PORT
}

impl NetworkSettings {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Configuration offered in place of a USB printer when none is attached:
    /// the shared receipt queue on the local machine.
    pub fn shared_printer_fallback() -> Self {
        Self::new(r"\\localhost\receipt", DEFAULT_RAW_PORT)
    }

    pub fn is_share_path(&self) -> bool {
        SHARE_PATH_PREFIXES
            .iter()
            .any(|prefix| self.address.trim().starts_with(prefix))
    }

    /// Resolve where payloads are delivered: a share path or a TCP endpoint.
    pub fn target(&self) -> Result<NetworkTarget> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "Network address cannot be empty".to_string(),
            ));
        }

        if self.is_share_path() {
            return Ok(NetworkTarget::Share(PathBuf::from(address)));
        }

        if self.port == 0 {
            return Err(DomainError::InvalidConfiguration(
                "Network port must be between 1 and 65535".to_string(),
            ));
        }

        Ok(NetworkTarget::Socket {
            host: address.to_string(),
            port: self.port,
        })
    }
}

/// Resolved network destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkTarget {
    /// Whole-file writes to an OS share path
    Share(PathBuf),
    /// One TCP connection per payload
    Socket { host: String, port: u16 },
}

impl std::fmt::Display for NetworkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Share(path) => write!(f, "{}", path.display()),
            Self::Socket { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Validated transport configuration, one variant per transport kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Serial(SerialSettings),
    Usb(UsbSettings),
    Network(NetworkTarget),
}

impl TransportConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Serial(_) => TransportKind::Serial,
            Self::Usb(_) => TransportKind::Usb,
            Self::Network(_) => TransportKind::Network,
        }
    }
}

impl std::fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serial(s) => write!(f, "serial {} @ {}", s.port, s.baud_rate),
            Self::Usb(u) => write!(f, "usb {}:{}", u.vendor_id, u.product_id),
            Self::Network(target) => write!(f, "network {target}"),
        }
    }
}

/// The single persisted printer record.
///
/// Stored as `{"type": "...", "<type>": {...}}`. Records built in code always carry
/// exactly the payload named by `type`; records read back from disk are checked by
/// [`PrinterConfig::transport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    #[serde(rename = "type")]
    kind: TransportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    serial: Option<SerialSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usb: Option<UsbSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network: Option<NetworkSettings>,
}

impl PrinterConfig {
    pub fn serial(settings: SerialSettings) -> Self {
        Self {
            kind: TransportKind::Serial,
            serial: Some(settings),
            usb: None,
            network: None,
        }
    }

    pub fn usb(settings: UsbSettings) -> Self {
        Self {
            kind: TransportKind::Usb,
            serial: None,
            usb: Some(settings),
            network: None,
        }
    }

    pub fn network(settings: NetworkSettings) -> Self {
        Self {
            kind: TransportKind::Network,
            serial: None,
            usb: None,
            network: Some(settings),
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Resolve the payload matching the declared kind.
    pub fn transport(&self) -> Result<TransportConfig> {
        match self.kind {
            TransportKind::Serial => {
                let serial = self.serial.as_ref().ok_or_else(|| missing(self.kind))?;
                serial.validate()?;
                Ok(TransportConfig::Serial(serial.clone()))
            }
            TransportKind::Usb => {
                let usb = self.usb.ok_or_else(|| missing(self.kind))?;
                Ok(TransportConfig::Usb(usb))
            }
            TransportKind::Network => {
                let network = self.network.as_ref().ok_or_else(|| missing(self.kind))?;
                Ok(TransportConfig::Network(network.target()?))
            }
        }
    }
}

fn missing(kind: TransportKind) -> DomainError {
    DomainError::InvalidConfiguration(format!("Invalid {kind} configuration: settings missing"))
}
