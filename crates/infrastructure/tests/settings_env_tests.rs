use infrastructure::AgentSettings;
use std::time::Duration;

#[test]
fn test_environment_overrides_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("agent.toml"),
        "[transport]\nnetwork_connect_timeout_ms = 750\n\n[encoder]\ncolumns = 32\n",
    )
    .unwrap();

    // Only test in this binary, so nothing else observes the variable
    unsafe {
        std::env::set_var("RECEIPT__ENCODER__COLUMNS", "48");
    }
    let settings = AgentSettings::load(dir.path()).unwrap();
    unsafe {
        std::env::remove_var("RECEIPT__ENCODER__COLUMNS");
    }

    assert_eq!(settings.encoder.columns, 48);
    assert_eq!(
        settings.transport.network_connect_timeout(),
        Duration::from_millis(750)
    );
}
