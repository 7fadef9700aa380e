use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Value object for a USB vendor or product id
///
/// Rules:
/// - 1 to 4 hex digits, case-insensitive on input
/// - Always rendered as 4 lowercase, zero-padded hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId(u16);

impl UsbId {
    pub const ZERO: UsbId = UsbId(0);

    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 4 {
            return Err(DomainError::InvalidUsbId(format!(
                "'{raw}' must be 1 to 4 hex digits"
            )));
        }

        u16::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| DomainError::InvalidUsbId(format!("'{raw}' is not hexadecimal")))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl From<u16> for UsbId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl FromStr for UsbId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for UsbId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<UsbId> for String {
    fn from(id: UsbId) -> Self {
        id.to_string()
    }
}

impl std::fmt::Display for UsbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}
