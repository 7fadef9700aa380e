pub mod builder;
pub mod context;
pub mod scheduler;
pub mod service;
pub mod tester;

pub use builder::{DEFAULT_COLUMNS, EscPosEncoder, ReceiptBuilder};
pub use context::TransportContext;
pub use scheduler::{Enqueued, WriteScheduler};
pub use service::{PrinterService, UsbSelection};
pub use tester::{ConnectionTestError, ConnectionTester, diagnostic_receipt};
