use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infrastructure::AgentSettings;
use receipt_agent::cli::Args;
use receipt_agent::commands;

async fn run() -> Result<()> {
    dotenv().ok();

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,receipt_agent=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    debug!(?args, "🖨️ Receipt Agent starting");

    let settings = AgentSettings::load(&args.config_dir).with_context(|| {
        format!(
            "Failed to load agent settings from {}",
            args.config_dir.display()
        )
    })?;

    let service = commands::build_service(&args, &settings);
    let mut stdout = std::io::stdout();
    let result = commands::execute(args.command.clone(), &service, &mut stdout).await;

    // Drain whatever is queued and release the printer before exiting
    service.shutdown().await;
    info!("👋 Good bye!");
    result
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        eprintln!("\n❌ ERROR: {:#}", e);
        std::process::exit(1);
    }
}
