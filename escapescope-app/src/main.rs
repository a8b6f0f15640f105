mod app_dir;
mod cli;
mod error;
mod preferences;
mod render_worker;
mod session;

use clap::Parser;
use tracing::{error, info};

use crate::cli::Cli;
use crate::preferences::AppPreferences;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting EscapeScope");

    let mut prefs = AppPreferences::load();
    if let Err(e) = cli::run(cli, &mut prefs) {
        error!("{e}");
        std::process::exit(1);
    }
}
