use anyhow::Result;
use clap::Parser;
use netscaler_exporter::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Nitro API username (overrides config)
    #[arg(long, env = "NETSCALER_USERNAME")]
    username: Option<String>,

    /// Nitro API password (overrides config)
    #[arg(long, env = "NETSCALER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Skip TLS certificate verification for every target
    #[arg(long)]
    ignore_cert: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting NetScaler Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(username) = args.username {
        config.netscaler.username = username;
    }
    if let Some(password) = args.password {
        config.netscaler.password = secrecy::SecretString::from(password);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if args.ignore_cert {
        config.netscaler.ignore_cert = true;
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    info!("Nitro user: {}", config.netscaler.username);
    info!(
        "Probe endpoint: http://{}:{}/probe",
        config.server.addr, config.server.port
    );

    // Start the exporter server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
