use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use application::printer::{
    EscPosEncoder, Enqueued, PrinterService, TransportContext, UsbSelection, WriteScheduler,
};
use domain::printer::{TransportFactory, UsbSettings};
use infrastructure::{
    AgentSettings, HardwareTransportFactory, HostDeviceRegistry, JsonConfigRepository,
    SimulatedHardware,
};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::cli::{Args, Command, UsbArgs};

/// Where the printer record lives: the CLI override wins over agent settings
pub fn printer_config_path(args: &Args, settings: &AgentSettings) -> PathBuf {
    args.printer_config
        .clone()
        .unwrap_or_else(|| settings.storage.printer_config_path())
}

/// Wire storage, hardware and the write scheduler into a service
pub fn build_service(args: &Args, settings: &AgentSettings) -> PrinterService {
    let config_path = printer_config_path(args, settings);
    info!(path = %config_path.display(), "📂 Printer configuration file");

    let factory: Arc<dyn TransportFactory> = if args.simulate {
        info!("🧪 Using simulated printer hardware");
        Arc::new(SimulatedHardware::new())
    } else {
        Arc::new(HardwareTransportFactory::new(settings.transport.clone()))
    };

    let (scheduler, _worker) = WriteScheduler::spawn(TransportContext::new(factory));

    PrinterService::new(
        Arc::new(JsonConfigRepository::new(config_path)),
        Arc::new(HostDeviceRegistry::new()),
        scheduler,
        Arc::new(EscPosEncoder::new(settings.encoder.columns)),
    )
}

fn usb_selection(args: UsbArgs) -> Result<UsbSelection> {
    if args.network_fallback {
        return Ok(UsbSelection::NetworkFallback);
    }
    let vendor_id = args.vendor_id.context("--vendor-id is required")?;
    let product_id = args.product_id.context("--product-id is required")?;
    Ok(UsbSelection::Device(UsbSettings {
        vendor_id,
        product_id,
    }))
}

async fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut payload = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut payload)
            .await
            .context("Failed to read payload from stdin")?;
        return Ok(payload);
    }
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read payload file {}", path.display()))
}

async fn show_config(service: &PrinterService, out: &mut impl Write) -> Result<()> {
    match service.current_config().await {
        Some(config) => writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?,
        None => writeln!(out, "Printer not configured")?,
    }
    Ok(())
}

/// Run one CLI command against the service, writing user-facing output to `out`
pub async fn execute(command: Command, service: &PrinterService, out: &mut impl Write) -> Result<()> {
    match command {
        Command::ListSerial => {
            let ports = service.list_serial_candidates().await;
            writeln!(out, "{}", serde_json::to_string_pretty(&ports)?)?;
        }
        Command::ListUsb => {
            let devices = service.list_usb_candidates().await;
            writeln!(out, "{}", serde_json::to_string_pretty(&devices)?)?;
        }
        Command::SaveSerial(serial) => {
            service.save_serial_config(serial.into()).await?;
            show_config(service, out).await?;
        }
        Command::SaveUsb(usb) => {
            service.save_usb_config(usb_selection(usb)?).await?;
            show_config(service, out).await?;
        }
        Command::SaveNetwork(network) => {
            service.save_network_config(network.into()).await?;
            show_config(service, out).await?;
        }
        Command::ShowConfig => show_config(service, out).await?,
        Command::Test => {
            service.test_connection().await?;
            writeln!(out, "Test print sent")?;
        }
        Command::Write { files } => {
            let kind = service.connect().await?;
            info!(%kind, files = files.len(), "Printer connected for raw writes");

            for path in &files {
                let payload = read_payload(path).await?;
                let bytes = payload.len();
                match service.submit_raw(payload) {
                    Enqueued::Queued { seq } => info!(seq, bytes, file = %path.display(), "Queued"),
                    Enqueued::Dropped => bail!("Printer transport closed before {} was queued", path.display()),
                }
            }

            service.drained().await;
            writeln!(out, "{} payload(s) written", files.len())?;
        }
    }
    Ok(())
}
