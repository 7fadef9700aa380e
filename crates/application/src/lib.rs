//! Application layer - Printer use cases and the write pipeline

pub mod printer;

pub use printer::{ConnectionTester, PrinterService, TransportContext, WriteScheduler};
