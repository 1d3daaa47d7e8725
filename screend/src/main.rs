//! screend — entry point.
//!
//! ```text
//! screend                          Serve /dev/graphics/fb0 on port 42380
//! screend /dev/fb1                 Serve a different capture device
//! screend --config <path>          Load a custom config TOML
//! screend --gen-config             Write default config to stdout
//! screend --fetch <addr> -o <file> Fetch one screenshot from a daemon
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use screend::config::ServerConfig;
use screend::service::ScreenshotService;
use screend_core::{ScreenClient, listen_for_interrupt};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "screend", about = "Frame-buffer screenshot daemon")]
struct Cli {
    /// Capture device (overrides the config file).
    device: Option<PathBuf>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "screend.toml")]
    config: PathBuf,

    /// Listen port (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Fetch one screenshot from a running daemon instead of serving.
    #[arg(long, value_name = "ADDR")]
    fetch: Option<SocketAddr>,

    /// Where `--fetch` writes the raw pixel data.
    #[arg(short, long, default_value = "screenshot.raw")]
    output: PathBuf,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ServerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config, then apply CLI overrides.
    let mut config = ServerConfig::load(&cli.config);
    if let Some(device) = cli.device {
        config.capture.device = device;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // --fetch: client mode.
    if let Some(addr) = cli.fetch {
        let image = ScreenClient::new(addr).fetch().await?;
        std::fs::write(&cli.output, image.pixels())?;
        println!(
            "{} {} {} -> {}",
            image.width(),
            image.height(),
            image.bits_per_pixel(),
            cli.output.display()
        );
        return Ok(());
    }

    info!("screend v{}", env!("CARGO_PKG_VERSION"));
    info!("listen address: {}", config.listen_addr());

    let service = ScreenshotService::new(config);
    tokio::spawn(listen_for_interrupt(service.shutdown_handle()));

    let report = service.run().await?;
    info!(
        "closed {} client connection(s), {} close failure(s)",
        report.clients_closed, report.close_failures
    );

    Ok(())
}
