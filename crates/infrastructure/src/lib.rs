//! Infrastructure layer - Printer hardware, storage and settings

pub mod registry;
pub mod repositories;
pub mod settings;
pub mod transport;

pub use registry::HostDeviceRegistry;
pub use repositories::JsonConfigRepository;
pub use settings::AgentSettings;
pub use transport::{HardwareTransportFactory, SimulatedHardware, Transport, WireEvent};
