use clap::Parser;
use dotenv::dotenv;
use eyre::Result;
use logwatch::{start_app, AppArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before clap reads the ES_* ones
    dotenv().ok();

    // Parse command line arguments
    let args = AppArgs::parse();

    // Logs go to stderr, observed events to stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    start_app(args).await
}
