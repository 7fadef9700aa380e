use serde::{Deserialize, Serialize};

/// Lifecycle of a transport handle: `Closed -> Opening -> Open -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    /// No handle held
    #[default]
    Closed,
    /// Acquiring the underlying handle
    Opening,
    /// Handle acquired, payloads may be sent
    Open,
}

impl TransportState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Transition to opening state
    pub fn to_opening(&self) -> Result<Self, &'static str> {
        match self {
            Self::Closed => Ok(Self::Opening),
            _ => Err("Can only open from Closed state"),
        }
    }

    /// Transition to open state
    pub fn to_open(&self) -> Result<Self, &'static str> {
        match self {
            Self::Opening => Ok(Self::Open),
            _ => Err("Can only complete an open from Opening state"),
        }
    }

    /// Explicit close, open failure or a send error treated as disconnect
    pub fn to_closed(&self) -> Self {
        Self::Closed
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
        };
        f.write_str(label)
    }
}
