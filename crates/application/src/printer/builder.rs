use domain::printer::{Alignment, PrintDirective, PrintEncoder};

/// Paper width of a standard 80mm receipt printer in Font A
pub const DEFAULT_COLUMNS: usize = 42;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// Fluent builder for a list of print directives
#[derive(Debug, Default)]
pub struct ReceiptBuilder {
    directives: Vec<PrintDirective>,
}

impl ReceiptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(mut self) -> Self {
        self.directives.push(PrintDirective::Initialize);
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.directives.push(PrintDirective::Align(alignment));
        self
    }

    pub fn align_center(self) -> Self {
        self.align(Alignment::Center)
    }

    pub fn align_left(self) -> Self {
        self.align(Alignment::Left)
    }

    pub fn bold(mut self, on: bool) -> Self {
        self.directives.push(PrintDirective::Bold(on));
        self
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.directives.push(PrintDirective::Line(text.into()));
        self
    }

    pub fn rule(mut self) -> Self {
        self.directives.push(PrintDirective::Rule);
        self
    }

    pub fn newline(mut self) -> Self {
        self.directives.push(PrintDirective::Newline);
        self
    }

    pub fn cut(mut self) -> Self {
        self.directives.push(PrintDirective::Cut);
        self
    }

    pub fn build(self) -> Vec<PrintDirective> {
        self.directives
    }
}

/// ESC/POS command encoder
#[derive(Debug, Clone, Copy)]
pub struct EscPosEncoder {
    columns: usize,
}

impl EscPosEncoder {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
        }
    }
}

impl Default for EscPosEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS)
    }
}

fn push_text(buffer: &mut Vec<u8>, text: &str) {
    // Printers run a single-byte code page; anything outside ASCII prints as '?'
    buffer.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
}

impl PrintEncoder for EscPosEncoder {
    fn encode(&self, directives: &[PrintDirective]) -> Vec<u8> {
        let mut buffer = Vec::new();
        for directive in directives {
            match directive {
                // ESC @: Initialize printer
                PrintDirective::Initialize => buffer.extend_from_slice(&[ESC, b'@']),
                // ESC a n: Align (0: Left, 1: Center, 2: Right)
                PrintDirective::Align(alignment) => {
                    let n = match alignment {
                        Alignment::Left => 0,
                        Alignment::Center => 1,
                        Alignment::Right => 2,
                    };
                    buffer.extend_from_slice(&[ESC, b'a', n]);
                }
                // ESC E n: Emphasis on/off
                PrintDirective::Bold(on) => buffer.extend_from_slice(&[ESC, b'E', u8::from(*on)]),
                PrintDirective::Line(text) => {
                    push_text(&mut buffer, text);
                    buffer.push(LF);
                }
                PrintDirective::Rule => {
                    buffer.extend(std::iter::repeat_n(b'-', self.columns));
                    buffer.push(LF);
                }
                PrintDirective::Newline => buffer.push(LF),
                // GS V 66 0: Feed to cut position and cut
                PrintDirective::Cut => buffer.extend_from_slice(&[GS, b'V', 66, 0]),
            }
        }
        buffer
    }
}
