//! Rentals Web Server
//!
//! Serves the accounts and listings API.

use clap::Parser;
use rentals_core::{init_logging, LoggingConfig, RentalsConfig};
use rentals_web::server::RentalsServerBuilder;
use rentals_web::WebConfig;
use std::path::PathBuf;
use tracing::{error, info};

/// Rentals Web Server - accounts and listings behind role-based access control
#[derive(Parser)]
#[command(name = "rentals-web")]
#[command(about = "HTTP API for the rentals service")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Database URL (e.g. sqlite://rentals.db); in-memory when omitted
    #[arg(long)]
    database_url: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_file_config(path: Option<&PathBuf>) -> Result<RentalsConfig, rentals_core::RentalsError> {
    match path {
        Some(path) => {
            let config = RentalsConfig::from_file(path)?;
            config.validate()?;
            Ok(config)
        }
        None => Ok(RentalsConfig::default()),
    }
}

/// Combine, lowest priority first: config file, environment, command line
fn build_web_config(args: &Args, file: &RentalsConfig) -> WebConfig {
    let mut config = WebConfig::from_env();

    if config.database_url.is_none() {
        config.database_url = file.storage.database_url.clone();
    }
    if let Some((username, password)) = file.bootstrap.admin_credentials() {
        config.admin_username.get_or_insert_with(|| username.to_string());
        config.admin_password.get_or_insert_with(|| password.to_string());
    }

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.dev {
        config.dev_mode = true;
    }
    if let Some(database_url) = &args.database_url {
        config.database_url = Some(database_url.clone());
    }

    config
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let file_config = match load_file_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut logging: LoggingConfig = file_config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = build_web_config(&args, &file_config);
    match &config.database_url {
        Some(url) => info!("Database: {}", url),
        None => info!("Database: in-memory"),
    }

    let server = match RentalsServerBuilder::with_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
