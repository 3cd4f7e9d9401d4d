//! # Autograde
//!
//! Auto-upgrades freshly placed structural pieces to each player's chosen
//! material tier.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP event bridge
//! autograde serve --host 0.0.0.0 --port 8080
//!
//! # Replay a scripted session
//! autograde simulate -f scenarios/raid.json
//!
//! # Inspect configuration and tiers
//! autograde config --format json
//! autograde catalog
//! ```

use autograde::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // AUTOGRADE_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("AUTOGRADE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "autograde=info,autograde_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
   autograde v{}
   twig -> wood -> stone -> metal -> armored
"#,
        env!("CARGO_PKG_VERSION")
    );
}
