use domain::printer::{DeviceRegistry, UsbCandidate, is_known_printer_vendor};
use infrastructure::HostDeviceRegistry;

#[tokio::test]
async fn test_usb_listing_is_never_empty() {
    let candidates = HostDeviceRegistry::new().usb_candidates().await;

    assert!(!candidates.is_empty());
    if candidates.iter().any(|c| c.network_fallback) {
        assert_eq!(candidates, vec![UsbCandidate::network_fallback()]);
    } else {
        assert!(
            candidates
                .iter()
                .all(|c| is_known_printer_vendor(c.vendor_id.value()))
        );
    }
}

#[tokio::test]
async fn test_serial_listing_has_port_paths() {
    let ports = HostDeviceRegistry::new().serial_candidates().await;
    assert!(ports.iter().all(|port| !port.path.is_empty()));
}
