use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Formatting directive understood by a [`PrintEncoder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintDirective {
    Initialize,
    Align(Alignment),
    Bold(bool),
    /// Text followed by a line feed
    Line(String),
    /// Horizontal rule across the paper width
    Rule,
    Newline,
    Cut,
}

/// Turns directives into the printer's command language. Pure: no I/O.
pub trait PrintEncoder: Send + Sync {
    fn encode(&self, directives: &[PrintDirective]) -> Vec<u8>;
}
