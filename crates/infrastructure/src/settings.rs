use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const APP_DIR_NAME: &str = "receipt-agent";
pub const PRINTER_CONFIG_FILE: &str = "printer-config.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the per-user location of the printer record
    pub config_path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn printer_config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(default_printer_config_path)
    }
}

/// `<user config dir>/receipt-agent/printer-config.json`
pub fn default_printer_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(PRINTER_CONFIG_FILE)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TransportSettings {
    pub serial_timeout_ms: u64,
    pub usb_timeout_ms: u64,
    pub network_connect_timeout_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            serial_timeout_ms: 1000,
            usb_timeout_ms: 5000,
            network_connect_timeout_ms: 5000,
        }
    }
}

impl TransportSettings {
    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(self.serial_timeout_ms)
    }

    pub fn usb_timeout(&self) -> Duration {
        Duration::from_millis(self.usb_timeout_ms)
    }

    pub fn network_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network_connect_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EncoderSettings {
    /// Characters per line, used for rules
    pub columns: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self { columns: 42 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AgentSettings {
    pub storage: StorageSettings,
    pub transport: TransportSettings,
    pub encoder: EncoderSettings,
}

impl AgentSettings {
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Optional settings file, e.g. config/agent.toml
            .add_source(File::with_name(&config_dir.join("agent").to_string_lossy()).required(false))
            // Environment variables (e.g. RECEIPT__TRANSPORT__USB_TIMEOUT_MS=2000)
            .add_source(Environment::with_prefix("RECEIPT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AgentSettings::load(dir.path()).unwrap();
        assert_eq!(settings.transport.serial_timeout(), Duration::from_millis(1000));
        assert_eq!(settings.transport.usb_timeout(), Duration::from_secs(5));
        assert_eq!(settings.encoder.columns, 42);
        assert!(settings.storage.config_path.is_none());
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agent.toml"),
            "[transport]\nusb_timeout_ms = 250\n\n[storage]\nconfig_path = \"/var/lib/receipt/printer.json\"\n",
        )
        .unwrap();

        let settings = AgentSettings::load(dir.path()).unwrap();
        assert_eq!(settings.transport.usb_timeout(), Duration::from_millis(250));
        assert_eq!(settings.transport.serial_timeout_ms, 1000);
        assert_eq!(
            settings.storage.printer_config_path(),
            PathBuf::from("/var/lib/receipt/printer.json")
        );
    }

    #[test]
    fn test_default_path_ends_with_record_name() {
        let path = StorageSettings::default().printer_config_path();
        assert!(path.ends_with(Path::new(APP_DIR_NAME).join(PRINTER_CONFIG_FILE)));
    }
}
