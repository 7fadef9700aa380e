use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid USB id: {0}")]
    InvalidUsbId(String),

    #[error("Invalid serial setting: {0}")]
    InvalidSerialSetting(String),

    #[error("Invalid printer configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
