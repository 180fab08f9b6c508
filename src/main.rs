use anyhow::Result;
use clap::Parser;
use fvmerger::cli::{self, Cli};
use fvmerger::client::GmailMailClient;
use fvmerger::config::Config;
use fvmerger::pdf::LopdfEngine;
use fvmerger::report::SummaryReporter;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: fvmerger --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // On non-Windows platforms, use aws-lc-rs; on Windows, use ring
    // (no NASM/CMake required there)
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize tracing with level based on verbose flag
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fvmerger=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("fvmerger=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("FVMerger starting...");

    let config = Config::load(&args.config).await?;

    let hub = fvmerger::auth::initialize_gmail_hub(
        Path::new(&config.gmail.credentials_path),
        Path::new(&config.gmail.token_cache_path),
    )
    .await?;

    let mail = GmailMailClient::new(hub);
    let pdf = LopdfEngine::new();

    let result = cli::run_pipeline(&args, &config, &mail, &pdf, chrono::Utc::now()).await?;

    let summary = SummaryReporter::new(config.report.signature.clone()).render(&result);
    println!("{}", summary);

    Ok(())
}
