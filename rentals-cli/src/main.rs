//! Rentals CLI - operator tooling for the rentals service
//!
//! Bootstraps accounts, prints the compiled-in permission table and
//! manages the configuration file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rentals_applications::{open_store, AccountService, Authorizer, Operation};
use rentals_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, LoggingConfig,
    RentalsConfig, RentalsResult,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "rentals")]
#[command(about = "Operator tooling for the rentals service")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account in the configured database
    CreateAccount {
        username: String,

        password: String,

        /// admin, realtor or client
        #[arg(short, long, default_value = "client")]
        role: String,

        /// Database URL, overrides the configuration file
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Print the permission table
    Policy {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a role may perform an operation on a resource
    Check {
        role: String,
        resource: String,
        /// create, read, update or delete
        operation: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::default();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting rentals CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::CreateAccount {
            username,
            password,
            role,
            database_url,
        } => {
            let database_url = database_url.or_else(|| config.storage.database_url.clone());
            handle_create_account(&username, &password, &role, database_url.as_deref()).await?;
        }
        Commands::Policy { json } => {
            handle_policy(json)?;
        }
        Commands::Check {
            role,
            resource,
            operation,
        } => {
            handle_check(&role, &resource, &operation)?;
        }
        Commands::Config {
            show,
            init,
            validate,
        } => {
            handle_config(cli.config.as_deref(), show, init, validate)?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> RentalsResult<RentalsConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return RentalsConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("rentals").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".rentals").join("config.toml")),
        Some(PathBuf::from("rentals.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return RentalsConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(RentalsConfig::default())
}

/// Default location written by `config --init`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("rentals").join("config.toml"))
}

async fn handle_create_account(
    username: &str,
    password: &str,
    role: &str,
    database_url: Option<&str>,
) -> anyhow::Result<()> {
    // An in-memory store would vanish with the process.
    let Some(database_url) = database_url else {
        bail!("No database configured; pass --database-url or set storage.database_url");
    };

    log_operation_start!("create_account", username = %username, role = %role);

    let store = open_store(Some(database_url))
        .await
        .with_context(|| format!("Failed to open database {}", database_url))?;
    let accounts = AccountService::new(store);

    match accounts.create(username, password, role).await {
        Ok(account) => {
            log_operation_success!("create_account", account_id = %account.id);
            println!("✅ Created {} account '{}' ({})", account.role, account.username, account.id);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("create_account", e);
            Err(e).context("Failed to create account")
        }
    }
}

fn render_policy(authorizer: &Authorizer) -> Vec<String> {
    authorizer
        .grants()
        .into_iter()
        .map(|((role, resource), operations)| {
            let operations: Vec<String> = operations.iter().map(|op| op.to_string()).collect();
            format!("{:<8} {:<9} {}", role, resource, operations.join(", "))
        })
        .collect()
}

fn handle_policy(json: bool) -> anyhow::Result<()> {
    let authorizer = Authorizer::with_default_policy();

    if json {
        let entries: Vec<serde_json::Value> = authorizer
            .grants()
            .into_iter()
            .map(|((role, resource), operations)| {
                serde_json::json!({
                    "role": role,
                    "resource": resource,
                    "operations": operations,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("📋 Permission table:");
    for line in render_policy(&authorizer) {
        println!("   {}", line);
    }
    Ok(())
}

fn check_permission(role: &str, resource: &str, operation: &str) -> RentalsResult<bool> {
    let operation: Operation = operation.parse()?;
    Ok(Authorizer::with_default_policy().allowed(role, resource, operation))
}

fn handle_check(role: &str, resource: &str, operation: &str) -> anyhow::Result<()> {
    if check_permission(role, resource, operation)? {
        println!("✅ {} may {} {}", role, operation, resource);
    } else {
        println!("❌ {} may not {} {}", role, operation, resource);
    }
    Ok(())
}

fn handle_config(
    config_path: Option<&Path>,
    show: bool,
    init: bool,
    validate: bool,
) -> anyhow::Result<()> {
    if init {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path().context("Could not determine a config directory")?,
        };
        if path.exists() {
            bail!("Configuration already exists at {:?}", path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        RentalsConfig::default().save_to_file(&path)?;
        println!("✅ Configuration initialized at: {:?}", path);
        println!("📝 Set storage.database_url and the bootstrap admin before starting the server.");
    }

    if show {
        let config = load_config(config_path)?;
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    if validate {
        let config = load_config(config_path)?;
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(())
}
