//! FundX backend entry point.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fundx_backend::config::Config;
use fundx_backend::metrics;
use fundx_backend::records::{Table, COMPLETED_COLUMN};
use fundx_backend::store::{IsFilter, SupabaseClient, TableStore};

/// FundX crowdfunding backend.
#[derive(Parser, Debug)]
#[command(name = "fundx-backend")]
#[command(about = "HTTP backend for FundX projects and contributions")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Fetch the projects still raising funds.
    ListProjects,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("fundx_backend=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let json_layer = args.json_logs.then(|| fmt::layer().json());
    let plain_layer = (!args.json_logs).then(fmt::layer);

    tracing_subscriber::registry()
        .with(json_layer)
        .with(plain_layer)
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::ListProjects) => cmd_list_projects().await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load configuration, failing hard on missing or invalid values.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FUNDX BACKEND - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Building database client... ");
    let client = match SupabaseClient::new(&config) {
        Ok(client) => {
            println!("OK");
            client
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Database client setup failed"));
        }
    };

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  REST endpoint: {}", client.rest_url());
    println!("  API key: {}", config.redacted_key());
    println!("  Listen: {}:{}", config.host, config.port);
    println!("  Request timeout: {}ms", config.http_timeout_ms);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("Enabled (port {})", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Fetch active projects once and print them.
async fn cmd_list_projects() -> anyhow::Result<()> {
    let config = load_config()?;
    let client = SupabaseClient::new(&config)?;

    let projects = client
        .select(Table::Projects, &IsFilter::new(COMPLETED_COLUMN, false))
        .await?;

    println!("Active projects: {}", projects.len());
    println!("----------------------------------------------------------------------");
    for project in &projects {
        let field = |key: &str| {
            project
                .get(key)
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "  {:<24} {:>12} {:<6} blob={}",
            field("name"),
            field("target_amount"),
            field("currency"),
            field("blob_id")
        );
    }

    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    info!("Configuration loaded successfully");

    if config.metrics_enabled {
        let addr = config
            .metrics_addr()
            .map_err(|e| anyhow::anyhow!("Invalid metrics address: {}", e))?;
        metrics::install_exporter(addr)?;
    }

    fundx_backend::api::serve(&config).await?;
    Ok(())
}
