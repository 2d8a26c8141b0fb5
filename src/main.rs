// src/main.rs

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use vantage::config::CONFIG;

#[derive(Parser)]
#[command(name = "vantage", about = "Conversational business-analysis assistant")]
struct Cli {
    /// Bind host (overrides VANTAGE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides VANTAGE_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = CONFIG.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Vantage");
    match &CONFIG.openai_api_model {
        Some(model) => info!("Model: {}", model),
        None => info!("Model: NOT CONFIGURED (set OPENAI_API_MODEL)"),
    }
    info!("Search API: {}", CONFIG.search_api_url);

    let host = cli.host.unwrap_or_else(|| CONFIG.host.clone());
    let port = cli.port.unwrap_or(CONFIG.port);

    vantage::chat::server::run(&CONFIG, &host, port).await
}
