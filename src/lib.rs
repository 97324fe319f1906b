pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eyre::Result;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use error::WatchError;
use services::poller::poll_logs;
use services::subscriber::subscribe_logs;
use services::transport::{connect, LogTransport};
use utils::config::{parse_timeout, Config, Mode};
use utils::ethereum::Web3Transport;

#[derive(Parser, Debug, Default)]
#[clap(author, version, about = "Logwatch - contract log subscriber and poller")]
pub struct AppArgs {
    /// JSON config file
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Websocket endpoint to connect to
    #[clap(long, env = "ES_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Ethereum address to subscribe to events for
    #[clap(long, env = "ES_ADDRESS")]
    pub address: Option<String>,

    /// Timeout for connect, subscribe and each query: "60s", "500ms", "2m", "1h",
    /// or a bare number of seconds
    #[clap(long, env = "ES_TIMEOUT", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Run the subscribe mode
    #[clap(long, env = "ES_SUBSCRIBE")]
    pub subscribe: bool,

    /// Run the get logs mode
    #[clap(long = "get-logs", env = "ES_GET_LOGS")]
    pub get_logs: bool,

    /// Number of blocks to query at once
    #[clap(long, env = "ES_LIMIT", allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// First block of the get logs mode
    #[clap(long, env = "ES_START_BLOCK")]
    pub start_block: Option<u64>,

    /// Pause between retries of a failed query, in milliseconds
    #[clap(long, env = "ES_RETRY_DELAY_MS")]
    pub retry_delay_ms: Option<u64>,
}

/// Resolves the configuration, connects and runs the selected mode until it
/// fails or the process is interrupted.
pub async fn start_app(args: AppArgs) -> Result<()> {
    let config = Config::resolve(&args)?;

    let Some(mode) = config.mode else {
        info!("nothing to do");
        return Ok(());
    };

    info!("Connecting to {}", config.endpoint);
    let transport = connect(&config.endpoint, config.timeout, Web3Transport::connect).await?;

    run(&transport, &config, mode, io::stdout(), tokio::signal::ctrl_c()).await
}

/// Runs one mode against an already connected transport until it fails or
/// `shutdown` resolves, writing what it observes to `output` as JSON lines.
///
/// Everything the mode has handed over is written before this returns, on
/// every exit path.
pub async fn run<T, W, S>(
    transport: &T,
    config: &Config,
    mode: Mode,
    output: W,
    shutdown: S,
) -> Result<()>
where
    T: LogTransport + ?Sized,
    W: Write + Send + 'static,
    S: Future<Output = io::Result<()>>,
{
    match mode {
        Mode::Subscribe => {
            let (tx, rx) = mpsc::channel(1);
            let printer = spawn_printer(rx, output);
            drive(subscribe_logs(transport, config, tx), printer, shutdown).await
        }
        Mode::Poll => {
            let (tx, rx) = mpsc::channel(1);
            let printer = spawn_printer(rx, output);
            drive(poll_logs(transport, config, tx), printer, shutdown).await
        }
    }
}

async fn drive<F, S>(consumer: F, printer: JoinHandle<()>, shutdown: S) -> Result<()>
where
    F: Future<Output = std::result::Result<(), WatchError>>,
    S: Future<Output = io::Result<()>>,
{
    // The consumer owns the sending half, so once it is dropped here the
    // printer drains what is left and stops.
    let result = tokio::select! {
        result = consumer => result.map_err(eyre::Report::from),
        signal = shutdown => match signal {
            Ok(()) => {
                info!("Interrupted");
                Ok(())
            }
            Err(e) => {
                Err(eyre::Report::from(e).wrap_err("failed to listen for shutdown signal"))
            }
        },
    };

    if let Err(e) = printer.await {
        warn!("Output task failed: {:?}", e);
    }
    result
}

fn spawn_printer<T, W>(mut rx: mpsc::Receiver<T>, mut output: W) -> JoinHandle<()>
where
    T: Serialize + Send + 'static,
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            let written = serde_json::to_string(&item)
                .map_err(io::Error::from)
                .and_then(|line| writeln!(output, "{}", line))
                .and_then(|()| output.flush());
            if let Err(e) = written {
                warn!("Failed to write output: {:?}", e);
            }
        }
    })
}
