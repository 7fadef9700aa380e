use async_trait::async_trait;
use domain::printer::{
    DeviceRegistry, SerialCandidate, UsbCandidate, UsbDescriptor, usb_candidates_from,
};
use tokio_serial::SerialPortType;
use tracing::{debug, info, warn};

/// Enumerates serial ports and USB devices attached to this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDeviceRegistry;

impl HostDeviceRegistry {
    pub fn new() -> Self {
        Self
    }
}

fn list_serial_ports() -> Vec<SerialCandidate> {
    match tokio_serial::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|port| SerialCandidate {
                manufacturer: match port.port_type {
                    SerialPortType::UsbPort(usb) => usb.manufacturer,
                    _ => None,
                },
                path: port.port_name,
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate serial ports");
            Vec::new()
        }
    }
}

fn list_usb_descriptors() -> rusb::Result<Vec<UsbDescriptor>> {
    let devices = rusb::devices()?;
    Ok(devices
        .iter()
        .filter_map(|device| match device.device_descriptor() {
            Ok(desc) => Some(UsbDescriptor {
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
                manufacturer_index: desc.manufacturer_string_index(),
                product_index: desc.product_string_index(),
            }),
            Err(e) => {
                debug!(
                    bus = device.bus_number(),
                    address = device.address(),
                    error = %e,
                    "Skipping USB device with unreadable descriptor"
                );
                None
            }
        })
        .collect())
}

#[async_trait]
impl DeviceRegistry for HostDeviceRegistry {
    async fn serial_candidates(&self) -> Vec<SerialCandidate> {
        match tokio::task::spawn_blocking(list_serial_ports).await {
            Ok(ports) => {
                debug!(count = ports.len(), "Serial ports enumerated");
                ports
            }
            Err(e) => {
                warn!(error = %e, "Serial enumeration task failed");
                Vec::new()
            }
        }
    }

    async fn usb_candidates(&self) -> Vec<UsbCandidate> {
        let descriptors = match tokio::task::spawn_blocking(list_usb_descriptors).await {
            Ok(Ok(descriptors)) => descriptors,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to enumerate USB devices, offering network printer");
                return vec![UsbCandidate::network_fallback()];
            }
            Err(e) => {
                warn!(error = %e, "USB enumeration task failed, offering network printer");
                return vec![UsbCandidate::network_fallback()];
            }
        };

        let candidates = usb_candidates_from(descriptors);
        if candidates.iter().any(|c| c.network_fallback) {
            info!("No USB printers found, suggesting network printer configuration");
        }
        candidates
    }
}
