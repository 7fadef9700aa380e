use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::printer::{ConfigError, ConfigRepository, PrinterConfig};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Printer record stored as pretty-printed JSON in a single file.
///
/// The first successful `load` caches the record for the rest of the process;
/// `save` replaces both the file (temp file + rename) and the cache.
pub struct JsonConfigRepository {
    path: PathBuf,
    cache: RwLock<Option<PrinterConfig>>,
}

impl JsonConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    async fn read_from_disk(&self) -> Option<PrinterConfig> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No printer configuration stored yet");
                return None;
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Printer configuration unreadable");
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Printer configuration unparsable, treating as unconfigured");
                None
            }
        }
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConfigRepository for JsonConfigRepository {
    async fn load(&self) -> Option<PrinterConfig> {
        if let Some(config) = self.cache.read().await.as_ref() {
            return Some(config.clone());
        }

        let mut cache = self.cache.write().await;
        if cache.is_none() {
            *cache = self.read_from_disk().await;
        }
        cache.clone()
    }

    async fn save(&self, config: &PrinterConfig) -> Result<(), ConfigError> {
        let json =
            serde_json::to_vec_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let io_error = |message: String| ConfigError::Io {
            path: self.path.display().to_string(),
            message,
        };

        // Held across the write so concurrent saves land in call order
        let mut cache = self.cache.write().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| io_error(e.to_string()))?
            .map_err(|e| io_error(e.to_string()))?;

        *cache = Some(config.clone());
        debug!(path = ?self.path, kind = %config.kind(), "Printer configuration written");
        Ok(())
    }
}
