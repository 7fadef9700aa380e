use application::printer::{
    EscPosEncoder, Enqueued, PrinterService, TransportContext, UsbSelection, WriteScheduler,
};
use async_trait::async_trait;
use domain::printer::{
    DeviceRegistry, NetworkTarget, PrinterConfig, SerialCandidate, SerialSettings, TransportKind,
    TransportState, UsbCandidate,
};
use infrastructure::{JsonConfigRepository, SimulatedHardware, WireEvent};
use std::sync::Arc;

struct NoDevices;

#[async_trait]
impl DeviceRegistry for NoDevices {
    async fn serial_candidates(&self) -> Vec<SerialCandidate> {
        Vec::new()
    }

    async fn usb_candidates(&self) -> Vec<UsbCandidate> {
        vec![UsbCandidate::network_fallback()]
    }
}

fn printable(data: &[u8]) -> String {
    data.iter()
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
        .collect()
}

fn setup(dir: &tempfile::TempDir, hardware: &SimulatedHardware) -> PrinterService {
    let repository = JsonConfigRepository::new(dir.path().join("printer-config.json"));
    let context = TransportContext::new(Arc::new(hardware.clone()));
    let (scheduler, _) = WriteScheduler::spawn(context);
    PrinterService::new(
        Arc::new(repository),
        Arc::new(NoDevices),
        scheduler,
        Arc::new(EscPosEncoder::default()),
    )
}

#[tokio::test]
async fn test_serial_com3_test_print_flow() {
    let dir = tempfile::tempdir().unwrap();
    let hardware = SimulatedHardware::new();
    let service = setup(&dir, &hardware);

    let settings = SerialSettings::new("COM3");
    service.save_serial_config(settings.clone()).await.unwrap();
    assert_eq!(
        service.current_config().await,
        Some(PrinterConfig::serial(settings))
    );

    service.test_connection().await.unwrap();

    let drained = hardware.drained_payloads();
    assert_eq!(drained.len(), 1);
    let text = printable(&drained[0]);
    println!("Printer Output (ASCII-fied): {}", text);
    assert!(text.contains("TEST PRINT"));
    assert!(text.contains("Connection Type: serial"));
    assert!(text.contains("printer is working correctly!"));
    assert_eq!(drained[0][..2], [0x1B, 0x40]);
    assert_eq!(drained[0][drained[0].len() - 4..], [0x1D, 0x56, 66, 0]);

    // Serial stays open after a test so raw writes can follow
    assert_eq!(service.scheduler().transport_state(), TransportState::Open);
    assert!(matches!(
        service.submit_raw(b"raw ticket".to_vec()),
        Enqueued::Queued { .. }
    ));
    service.drained().await;
    assert_eq!(hardware.drained_payloads().len(), 2);
}

#[tokio::test]
async fn test_config_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let hardware = SimulatedHardware::new();

    {
        let service = setup(&dir, &hardware);
        let selection = UsbSelection::from(&service.list_usb_candidates().await[0]);
        service.save_usb_config(selection).await.unwrap();
        service.shutdown().await;
    }

    let service = setup(&dir, &hardware);
    let config = service.current_config().await.unwrap();
    assert_eq!(config.kind(), TransportKind::Network);
    match config.transport().unwrap() {
        domain::printer::TransportConfig::Network(NetworkTarget::Share(path)) => {
            assert_eq!(path.to_string_lossy(), r"\\localhost\receipt");
        }
        other => panic!("unexpected transport {:?}", other),
    }
}

#[tokio::test]
async fn test_not_configured_until_saved() {
    let dir = tempfile::tempdir().unwrap();
    let hardware = SimulatedHardware::new();
    let service = setup(&dir, &hardware);

    assert!(service.current_config().await.is_none());
    assert!(service.test_connection().await.is_err());
    assert_eq!(service.submit_raw(b"nothing open".to_vec()), Enqueued::Dropped);
    assert!(hardware.events().is_empty());
}

#[tokio::test]
async fn test_shutdown_drains_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let hardware = SimulatedHardware::new();
    let service = setup(&dir, &hardware);
    service
        .save_serial_config(SerialSettings::new("/dev/ttyUSB0"))
        .await
        .unwrap();
    service.connect().await.unwrap();

    service.submit_raw(b"one".to_vec());
    service.submit_raw(b"two".to_vec());
    service.shutdown().await;

    assert_eq!(
        hardware.events(),
        vec![
            WireEvent::Opened(TransportKind::Serial),
            WireEvent::SendStarted(b"one".to_vec()),
            WireEvent::Drained(b"one".to_vec()),
            WireEvent::SendStarted(b"two".to_vec()),
            WireEvent::Drained(b"two".to_vec()),
            WireEvent::Closed(TransportKind::Serial),
        ]
    );
}
