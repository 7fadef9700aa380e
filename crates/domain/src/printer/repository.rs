use async_trait::async_trait;
use thiserror::Error;

use super::config::PrinterConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config storage I/O failed for {path}: {message}")]
    Io { path: String, message: String },
    #[error("Config serialization failed: {0}")]
    Serialize(String),
}

/// Storage for the single printer record
///
/// `load` treats missing or unreadable storage as "not configured" rather than an
/// error. A successful `save` is visible to the next `load` without re-reading storage.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load(&self) -> Option<PrinterConfig>;

    async fn save(&self, config: &PrinterConfig) -> Result<(), ConfigError>;
}
