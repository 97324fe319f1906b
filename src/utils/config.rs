use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use web3::types::Address;

use crate::error::{Result, WatchError};
use crate::AppArgs;

/// WBNB ERC-20 token contract.
pub const DEFAULT_ADDRESS: &str = "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_LIMIT: i64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Subscribe,
    Poll,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Subscribe => "subscribe",
            Mode::Poll => "get-logs",
        }
    }
}

/// Resolved settings, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub address: Address,
    pub timeout: Duration,
    /// `None` when no mode was selected.
    pub mode: Option<Mode>,
    pub page_size: u64,
    pub start_block: u64,
    pub retry_delay: Duration,
}

/// Settings read from the `--config` JSON file. Anything set on the command
/// line or in the environment wins over these.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub address: Option<String>,
    /// Same format as `--timeout`.
    pub timeout: Option<String>,
    pub subscribe: bool,
    pub get_logs: bool,
    pub limit: Option<i64>,
    pub start_block: Option<u64>,
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|source| WatchError::ConfigRead { path: path_str.clone(), source })?;
        serde_json::from_str(&contents)
            .map_err(|source| WatchError::ConfigParse { path: path_str, source })
    }
}

impl Config {
    /// Merges command line, environment and config file, then validates the
    /// result. Nothing here touches the network.
    pub fn resolve(args: &AppArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let subscribe = args.subscribe || file.subscribe;
        let get_logs = args.get_logs || file.get_logs;
        let mode = match (subscribe, get_logs) {
            (true, true) => return Err(WatchError::ConflictingModes),
            (true, false) => Some(Mode::Subscribe),
            (false, true) => Some(Mode::Poll),
            (false, false) => None,
        };

        let limit = args.limit.or(file.limit).unwrap_or(DEFAULT_LIMIT);
        let page_size = parse_page_size(limit)?;

        let address = args
            .address
            .as_deref()
            .or(file.address.as_deref())
            .unwrap_or(DEFAULT_ADDRESS);
        let address = parse_address(address)?;

        let endpoint = args.endpoint.clone().or(file.endpoint).unwrap_or_default();
        if let Some(mode) = mode {
            if endpoint.trim().is_empty() {
                return Err(WatchError::MissingEndpoint(mode.name()));
            }
        }

        let timeout = match (args.timeout, file.timeout.as_deref()) {
            (Some(timeout), _) => timeout,
            (None, Some(raw)) => {
                parse_timeout(raw).map_err(|_| WatchError::InvalidTimeout(raw.to_string()))?
            }
            (None, None) => DEFAULT_TIMEOUT,
        };
        let retry_delay = args
            .retry_delay_ms
            .or(file.retry_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(crate::services::poller::RETRY_DELAY);

        Ok(Self {
            endpoint,
            address,
            timeout,
            mode,
            page_size,
            start_block: args.start_block.or(file.start_block).unwrap_or(0),
            retry_delay,
        })
    }
}

pub fn parse_page_size(limit: i64) -> Result<u64> {
    if limit <= 0 {
        return Err(WatchError::InvalidPageSize(limit));
    }
    Ok(limit as u64)
}

/// Parses a timeout such as `60s`, `500ms`, `2m` or `1h`. A bare number is
/// read as seconds.
pub fn parse_timeout(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    let split = input.find(|c: char| !c.is_ascii_digit()).unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);
    let value: u64 = digits.parse().map_err(|_| format!("invalid timeout {:?}", input))?;
    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(3600))),
        _ => Err(format!("invalid timeout {:?}: expected a unit of ms, s, m or h", input)),
    }
}

/// Parses a 20-byte hex address, with or without the `0x` prefix.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != 40 {
        return Err(WatchError::InvalidAddress(input.to_string()));
    }
    Address::from_str(hex).map_err(|_| WatchError::InvalidAddress(input.to_string()))
}
