use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use domain::printer::{
    DEFAULT_RAW_PORT, DataBits, NetworkSettings, Parity, SerialSettings, StopBits, UsbId,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Receipt printer transport agent", long_about = None)]
pub struct Args {
    /// Directory holding the optional agent settings file (agent.toml / .json / .yaml)
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    /// Override where the printer record is stored
    #[arg(long, global = true)]
    pub printer_config: Option<PathBuf>,

    /// Use simulated hardware instead of real devices
    #[arg(long, global = true)]
    pub simulate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List serial ports on this machine
    ListSerial,
    /// List attached USB receipt printers
    ListUsb,
    /// Save a serial printer configuration
    SaveSerial(SerialArgs),
    /// Save a USB printer configuration
    SaveUsb(UsbArgs),
    /// Save a network printer configuration
    SaveNetwork(NetworkArgs),
    /// Print the saved printer configuration
    ShowConfig,
    /// Print a diagnostic receipt on the configured printer
    Test,
    /// Send raw files to the configured printer, one payload per file ("-" reads stdin)
    Write {
        #[arg(default_value = "-")]
        files: Vec<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct SerialArgs {
    /// Port name, e.g. COM3 or /dev/ttyUSB0
    #[arg(long)]
    pub port: String,

    #[arg(long, default_value_t = 9600)]
    pub baud_rate: u32,

    #[arg(long, default_value = "8", value_parser = parse_data_bits)]
    pub data_bits: DataBits,

    #[arg(long, default_value = "none", value_parser = parse_parity)]
    pub parity: Parity,

    #[arg(long, default_value = "1", value_parser = parse_stop_bits)]
    pub stop_bits: StopBits,
}

impl From<SerialArgs> for SerialSettings {
    fn from(args: SerialArgs) -> Self {
        Self {
            port: args.port,
            baud_rate: args.baud_rate,
            data_bits: args.data_bits,
            parity: args.parity,
            stop_bits: args.stop_bits,
        }
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct UsbArgs {
    /// Vendor id in hex, e.g. 04b8
    #[arg(long, required_unless_present = "network_fallback")]
    pub vendor_id: Option<UsbId>,

    /// Product id in hex, e.g. 0202
    #[arg(long, required_unless_present = "network_fallback")]
    pub product_id: Option<UsbId>,

    /// Save the shared network printer instead of a USB device
    #[arg(long, conflicts_with_all = ["vendor_id", "product_id"])]
    pub network_fallback: bool,
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct NetworkArgs {
    /// Host name, IP address or share path (\\server\printer)
    #[arg(long)]
    pub address: String,

    #[arg(long, default_value_t = DEFAULT_RAW_PORT)]
    pub port: u16,
}

impl From<NetworkArgs> for NetworkSettings {
    fn from(args: NetworkArgs) -> Self {
        Self::new(args.address, args.port)
    }
}

fn parse_data_bits(raw: &str) -> Result<DataBits, String> {
    let bits: u8 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    DataBits::try_from(bits).map_err(|e| e.to_string())
}

fn parse_stop_bits(raw: &str) -> Result<StopBits, String> {
    let bits: f64 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    StopBits::try_from(bits).map_err(|e| e.to_string())
}

fn parse_parity(raw: &str) -> Result<Parity, String> {
    match raw.to_ascii_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "even" => Ok(Parity::Even),
        "odd" => Ok(Parity::Odd),
        other => Err(format!("expected none, even or odd, got {other}")),
    }
}
