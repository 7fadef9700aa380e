use std::time::Duration;

use async_trait::async_trait;
use domain::printer::{
    DataBits, Parity, PrinterTransport, SerialSettings, StopBits, TransportError, TransportKind,
    TransportState,
};
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

fn to_data_bits(bits: DataBits) -> tokio_serial::DataBits {
    match bits {
        DataBits::Five => tokio_serial::DataBits::Five,
        DataBits::Six => tokio_serial::DataBits::Six,
        DataBits::Seven => tokio_serial::DataBits::Seven,
        DataBits::Eight => tokio_serial::DataBits::Eight,
    }
}

fn to_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn to_stop_bits(stop_bits: StopBits) -> Result<tokio_serial::StopBits, TransportError> {
    match stop_bits {
        StopBits::One => Ok(tokio_serial::StopBits::One),
        StopBits::Two => Ok(tokio_serial::StopBits::Two),
        StopBits::OnePointFive => Err(TransportError::Unsupported(
            "1.5 stop bits are not supported by the serial backend".to_string(),
        )),
    }
}

/// Normalize port name for Windows (e.g., COM7 -> \\.\COM7)
fn native_port_name(port: &str) -> String {
    if cfg!(target_os = "windows") && !port.to_uppercase().starts_with(r"\\.\") {
        format!(r"\\.\{}", port)
    } else {
        port.to_string()
    }
}

/// Serial (RS-232 / USB-serial) printer link
pub struct SerialTransport {
    settings: SerialSettings,
    timeout: Duration,
    port: Option<SerialStream>,
    state: TransportState,
}

impl SerialTransport {
    pub fn new(settings: SerialSettings, timeout: Duration) -> Self {
        Self {
            settings,
            timeout,
            port: None,
            state: TransportState::Closed,
        }
    }
}

#[async_trait]
impl PrinterTransport for SerialTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Serial
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            self.close().await;
        }
        self.state = TransportState::Opening;

        let port_name = native_port_name(&self.settings.port);
        tracing::debug!(
            port = %port_name,
            baud_rate = self.settings.baud_rate,
            "Opening serial port"
        );

        let stop_bits = match to_stop_bits(self.settings.stop_bits) {
            Ok(bits) => bits,
            Err(e) => {
                self.state = TransportState::Closed;
                return Err(e);
            }
        };

        let port = tokio_serial::new(&port_name, self.settings.baud_rate)
            .data_bits(to_data_bits(self.settings.data_bits))
            .parity(to_parity(self.settings.parity))
            .stop_bits(stop_bits)
            .timeout(self.timeout)
            .open_native_async()
            .map_err(|e| {
                tracing::warn!(port = %port_name, error = %e, "Failed to open serial port");
                TransportError::OpenFailed(format!(
                    "Failed to open serial port {}: {}. Ensure the port is not used by another application and that you have sufficient permissions.",
                    port_name, e
                ))
            });

        match port {
            Ok(port) => {
                self.port = Some(port);
                self.state = TransportState::Open;
                tracing::info!(port = %self.settings.port, "Serial port opened");
                Ok(())
            }
            Err(e) => {
                self.state = TransportState::Closed;
                Err(e)
            }
        }
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        port.write_all(payload)
            .await
            .map_err(|e| TransportError::SendFailed(format!("Write error: {}", e)))?;

        // flush waits for the OS output buffer to drain
        port.flush()
            .await
            .map_err(|e| TransportError::SendFailed(format!("Drain error: {}", e)))?;

        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.shutdown().await {
                tracing::warn!(error = %e, "Error shutting down serial port");
            }
            tracing::info!(port = %self.settings.port, "Serial port closed");
        }
        self.state = TransportState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_setting_conversion() {
        assert!(matches!(
            to_data_bits(DataBits::Seven),
            tokio_serial::DataBits::Seven
        ));
        assert!(matches!(to_parity(Parity::Odd), tokio_serial::Parity::Odd));
        assert!(matches!(
            to_stop_bits(StopBits::Two).unwrap(),
            tokio_serial::StopBits::Two
        ));
    }

    #[test]
    fn test_one_and_a_half_stop_bits_unsupported() {
        assert!(matches!(
            to_stop_bits(StopBits::OnePointFive),
            Err(TransportError::Unsupported(_))
        ));
    }

    #[test]
    fn test_serial_initial_state() {
        let transport = SerialTransport::new(SerialSettings::new("COM1"), Duration::from_secs(1));
        assert_eq!(transport.state(), TransportState::Closed);
        assert_eq!(transport.kind(), TransportKind::Serial);
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let mut transport =
            SerialTransport::new(SerialSettings::new("COM1"), Duration::from_secs(1));
        transport.close().await;
        assert_eq!(transport.state(), TransportState::Closed);
    }

    #[tokio::test]
    async fn test_send_when_closed_is_not_open() {
        let mut transport =
            SerialTransport::new(SerialSettings::new("COM1"), Duration::from_secs(1));
        assert_eq!(transport.send(b"x").await, Err(TransportError::NotOpen));
    }

    #[tokio::test]
    async fn test_open_missing_port_fails_and_stays_closed() {
        let mut settings = SerialSettings::new("/dev/receipt-agent-missing-port");
        settings.baud_rate = 9600;
        let mut transport = SerialTransport::new(settings, Duration::from_millis(100));

        let result = transport.open().await;
        assert!(matches!(result, Err(TransportError::OpenFailed(_))));
        assert_eq!(transport.state(), TransportState::Closed);
    }
}
