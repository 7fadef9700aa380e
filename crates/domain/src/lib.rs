//! Domain layer - Pure printer model with no I/O
//!
//! This crate contains:
//! - The persisted printer record and the closed transport configuration type
//! - The transport lifecycle state machine
//! - Discovered device descriptors and the USB vendor allow-list
//! - Seams implemented elsewhere (transports, storage, enumeration, encoding)

pub mod error;
pub mod printer;

// Re-export commonly used types
pub use error::DomainError;
pub use printer::{PrinterConfig, TransportConfig, TransportKind, TransportState};
