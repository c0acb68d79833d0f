use serde::{Deserialize, Serialize};

/// A closed time interval in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }
}
