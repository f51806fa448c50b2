use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use layerscan::{
    applier::StoreApplier,
    cache::Cache,
    config::Config,
    detector::{OsvClient, OsvLibraryDetector, OsvOsPackageDetector},
    LocalScanner, ScanOptions,
};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "layerscan")]
#[command(
    author,
    version,
    about = "Scan layered artifacts for OS package and library vulnerabilities"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an artifact made of stored layers
    Scan {
        /// Artifact name used to label the OS result (e.g. alpine:latest)
        target: String,

        /// Layer IDs, from the base layer up
        #[arg(short, long = "layer", required = true)]
        layers: Vec<String>,

        /// Secondary artifact reference, e.g. a repository digest
        #[arg(long, default_value = "")]
        secondary_target: String,

        /// Comma separated detectors to run (os, library)
        #[arg(long)]
        vuln_type: Option<ScanOptions>,

        /// Write the JSON report to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Clear the detector cache before scanning
        #[arg(long)]
        clear_cache: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the detector cache
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load()?;

    match cli.command {
        Commands::Scan {
            target,
            layers,
            secondary_target,
            vuln_type,
            output,
            clear_cache,
        } => {
            let cache = Cache::with_ttl_hours(config.cache_ttl_hours);
            if clear_cache {
                cache.clear()?;
            }

            let options = vuln_type.unwrap_or_else(|| config.scan_options());
            run_scan(&config, cache, &target, &secondary_target, &layers, &options, output).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            Cache::with_ttl_hours(config.cache_ttl_hours).clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    config: &Config,
    cache: Cache,
    target: &str,
    secondary_target: &str,
    layers: &[String],
    options: &ScanOptions,
    output_file: Option<String>,
) -> Result<u8> {
    let client = OsvClient::new()
        .with_base_url(&config.osv_api_url)
        .with_cache(cache);

    let scanner = LocalScanner::new(
        Box::new(StoreApplier::new(config.layer_store())),
        Box::new(OsvOsPackageDetector::new(client.clone())),
        Box::new(OsvLibraryDetector::new(client)),
    );

    let mut report = scanner
        .scan(target, secondary_target, layers, options)
        .await?;

    if !config.ignore.is_empty() {
        report.retain_vulnerabilities(|v| !config.ignore.should_ignore(v));
    }

    info!(
        results = report.results.len(),
        vulnerabilities = report.vulnerability_count(),
        eosl = report.eosl,
        "scan finished"
    );

    let json = serde_json::to_string_pretty(&report)?;
    match output_file {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("failed to write {path}"))?;
            eprintln!("Results written to: {}", path);
        }
        None => println!("{}", json),
    }

    Ok(exit_codes::SUCCESS)
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'layerscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
