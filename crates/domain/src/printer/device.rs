use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::usb_id::UsbId;

/// USB vendor ids of common receipt/label printer makers
pub const KNOWN_PRINTER_VENDORS: [(u16, &str); 5] = [
    (0x04b8, "Epson"),
    (0x04f9, "Brother"),
    (0x03f0, "HP"),
    (0x04a9, "Canon"),
    (0x047e, "Zebra"),
];

pub const NETWORK_FALLBACK_DESCRIPTION: &str = "Network Printer (Windows Shared Printer)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialCandidate {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

/// Raw descriptor fields read from the host USB stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer_index: Option<u8>,
    pub product_index: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsbCandidate {
    pub vendor_id: UsbId,
    pub product_id: UsbId,
    /// String descriptor index, not the string itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<u8>,
    /// Synthetic entry telling the UI to offer network configuration instead
    #[serde(rename = "isNetworkFallback", default)]
    pub network_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UsbCandidate {
    pub fn network_fallback() -> Self {
        Self {
            vendor_id: UsbId::ZERO,
            product_id: UsbId::ZERO,
            manufacturer: Some(0),
            product: Some(0),
            network_fallback: true,
            description: Some(NETWORK_FALLBACK_DESCRIPTION.to_string()),
        }
    }
}

pub fn is_known_printer_vendor(vendor_id: u16) -> bool {
    KNOWN_PRINTER_VENDORS.iter().any(|(id, _)| *id == vendor_id)
}

/// Keep devices from known printer vendors; fall back to the network entry when none match.
pub fn usb_candidates_from(devices: impl IntoIterator<Item = UsbDescriptor>) -> Vec<UsbCandidate> {
    let printers: Vec<UsbCandidate> = devices
        .into_iter()
        .filter(|d| is_known_printer_vendor(d.vendor_id))
        .map(|d| UsbCandidate {
            vendor_id: UsbId::from(d.vendor_id),
            product_id: UsbId::from(d.product_id),
            manufacturer: d.manufacturer_index,
            product: d.product_index,
            network_fallback: false,
            description: None,
        })
        .collect();

    if printers.is_empty() {
        vec![UsbCandidate::network_fallback()]
    } else {
        printers
    }
}

/// Enumerates candidate devices for the configuration pickers.
///
/// Enumeration failures are never surfaced: they produce an empty serial list and
/// the network fallback entry for USB.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn serial_candidates(&self) -> Vec<SerialCandidate>;

    async fn usb_candidates(&self) -> Vec<UsbCandidate>;
}
