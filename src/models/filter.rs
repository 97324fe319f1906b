use std::fmt;

use serde::Serialize;
use web3::types::{Address, BlockNumber, Filter, FilterBuilder, U64};

/// An inclusive block range `[offset, offset + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockWindow {
    pub offset: u64,
    pub size: u64,
}

impl BlockWindow {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    pub fn from(&self) -> u64 {
        self.offset
    }

    pub fn to(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    /// The window that follows this one after a successful query.
    pub fn advance(&self) -> Self {
        Self { offset: self.to(), size: self.size }
    }
}

impl fmt::Display for BlockWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from(), self.to())
    }
}

/// Address and optional block bounds selecting the logs a subscription or
/// query returns. No bounds means live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub addresses: Vec<Address>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl FilterSpec {
    pub fn live(address: Address) -> Self {
        Self { addresses: vec![address], from_block: None, to_block: None }
    }

    pub fn window(address: Address, window: BlockWindow) -> Self {
        Self {
            addresses: vec![address],
            from_block: Some(window.from()),
            to_block: Some(window.to()),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{addresses: {:?}", self.addresses)?;
        if let Some(from) = self.from_block {
            write!(f, ", fromBlock: {}", from)?;
        }
        if let Some(to) = self.to_block {
            write!(f, ", toBlock: {}", to)?;
        }
        write!(f, "}}")
    }
}

impl From<&FilterSpec> for Filter {
    fn from(spec: &FilterSpec) -> Self {
        let mut builder = FilterBuilder::default().address(spec.addresses.clone());
        if let Some(from) = spec.from_block {
            builder = builder.from_block(BlockNumber::Number(U64::from(from)));
        }
        if let Some(to) = spec.to_block {
            builder = builder.to_block(BlockNumber::Number(U64::from(to)));
        }
        builder.build()
    }
}
