use serde::Serialize;
use web3::types::Log;

pub mod filter;

use filter::BlockWindow;

/// Logs returned by one successful query, together with the window queried.
#[derive(Debug, Clone, Serialize)]
pub struct LogBatch {
    pub window: BlockWindow,
    pub logs: Vec<Log>,
}

impl LogBatch {
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
