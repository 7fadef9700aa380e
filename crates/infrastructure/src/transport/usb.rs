use std::time::Duration;

use async_trait::async_trait;
use domain::printer::{PrinterTransport, TransportError, TransportKind, TransportState, UsbSettings};
use rusb::{DeviceHandle, Direction, GlobalContext, TransferType};
use tracing::{debug, info, warn};

/// Exclusive claim on the printer interface
struct ClaimedInterface {
    handle: DeviceHandle<GlobalContext>,
    interface: u8,
    endpoint: u8,
    kernel_driver_detached: bool,
}

impl ClaimedInterface {
    /// Release the interface and hand the device back to the kernel. Best effort.
    fn release(self) {
        if let Err(e) = self.handle.release_interface(self.interface) {
            warn!(interface = self.interface, error = %e, "Failed to release USB interface");
        }
        if self.kernel_driver_detached {
            if let Err(e) = self.handle.attach_kernel_driver(self.interface) {
                debug!(interface = self.interface, error = %e, "Kernel driver not reattached");
            }
        }
        // Dropping the handle closes the device
    }
}

fn find_bulk_out_endpoint(interface: &rusb::Interface<'_>) -> Option<u8> {
    for descriptor in interface.descriptors() {
        for endpoint in descriptor.endpoint_descriptors() {
            if matches!(endpoint.direction(), Direction::Out)
                && matches!(endpoint.transfer_type(), TransferType::Bulk)
            {
                return Some(endpoint.address());
            }
        }
    }
    None
}

fn open_failed(context: &str, e: rusb::Error) -> TransportError {
    TransportError::OpenFailed(format!("{}: {}", context, e))
}

fn claim(settings: UsbSettings) -> Result<ClaimedInterface, TransportError> {
    let label = format!("{}:{}", settings.vendor_id, settings.product_id);
    let handle = rusb::open_device_with_vid_pid(
        settings.vendor_id.value(),
        settings.product_id.value(),
    )
    .ok_or_else(|| TransportError::DeviceNotFound(format!("USB printer {}", label)))?;

    let config = handle
        .device()
        .active_config_descriptor()
        .map_err(|e| open_failed("Cannot read USB configuration", e))?;
    let interface = config
        .interfaces()
        .next()
        .ok_or_else(|| TransportError::OpenFailed("No USB interfaces found".to_string()))?;
    let number = interface.number();

    let kernel_driver_detached = match handle.kernel_driver_active(number) {
        Ok(true) => {
            handle
                .detach_kernel_driver(number)
                .map_err(|e| open_failed("Cannot detach kernel driver", e))?;
            true
        }
        _ => false,
    };

    if let Err(e) = handle.claim_interface(number) {
        if kernel_driver_detached {
            let _ = handle.attach_kernel_driver(number);
        }
        return Err(open_failed("Cannot claim USB interface", e));
    }

    let mut claimed = ClaimedInterface {
        handle,
        interface: number,
        endpoint: 0,
        kernel_driver_detached,
    };

    match find_bulk_out_endpoint(&interface) {
        Some(endpoint) => {
            claimed.endpoint = endpoint;
            Ok(claimed)
        }
        None => {
            claimed.release();
            Err(TransportError::NoOutEndpoint(number))
        }
    }
}

/// Raw USB printer link over the first interface's bulk OUT endpoint.
///
/// libusb calls block, so each one runs on the blocking pool.
pub struct UsbTransport {
    settings: UsbSettings,
    timeout: Duration,
    claim: Option<ClaimedInterface>,
    state: TransportState,
}

impl UsbTransport {
    pub fn new(settings: UsbSettings, timeout: Duration) -> Self {
        Self {
            settings,
            timeout,
            claim: None,
            state: TransportState::Closed,
        }
    }
}

#[async_trait]
impl PrinterTransport for UsbTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Usb
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.claim.is_some() {
            self.close().await;
        }
        self.state = TransportState::Opening;

        let settings = self.settings;
        let result = tokio::task::spawn_blocking(move || claim(settings))
            .await
            .map_err(|e| TransportError::OpenFailed(format!("USB open task failed: {}", e)))
            .and_then(|r| r);

        match result {
            Ok(claimed) => {
                info!(
                    vendor_id = %self.settings.vendor_id,
                    product_id = %self.settings.product_id,
                    interface = claimed.interface,
                    endpoint = claimed.endpoint,
                    "USB printer interface claimed"
                );
                self.claim = Some(claimed);
                self.state = TransportState::Open;
                Ok(())
            }
            Err(e) => {
                warn!(vendor_id = %self.settings.vendor_id, product_id = %self.settings.product_id, error = %e, "Failed to open USB printer");
                self.state = TransportState::Closed;
                Err(e)
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let claimed = self.claim.take().ok_or(TransportError::NotOpen)?;
        let data = payload.to_vec();
        let timeout = self.timeout;

        let joined = tokio::task::spawn_blocking(move || {
            let result = claimed.handle.write_bulk(claimed.endpoint, &data, timeout);
            (claimed, result, data.len())
        })
        .await;

        let (claimed, result, expected) = match joined {
            Ok(parts) => parts,
            Err(e) => {
                // The handle went down with the task
                self.state = TransportState::Closed;
                return Err(TransportError::SendFailed(format!("USB transfer task failed: {}", e)));
            }
        };
        self.claim = Some(claimed);

        match result {
            Ok(written) if written == expected => Ok(()),
            Ok(written) => Err(TransportError::SendFailed(format!(
                "Short bulk transfer: {} of {} bytes",
                written, expected
            ))),
            Err(e) => Err(TransportError::SendFailed(format!("Bulk transfer failed: {}", e))),
        }
    }

    async fn close(&mut self) {
        if let Some(claimed) = self.claim.take() {
            if let Err(e) = tokio::task::spawn_blocking(move || claimed.release()).await {
                warn!(error = %e, "USB release task failed");
            }
            info!(
                vendor_id = %self.settings.vendor_id,
                product_id = %self.settings.product_id,
                "USB printer released"
            );
        }
        self.state = TransportState::Closed;
    }
}
