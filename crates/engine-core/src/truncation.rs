use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks which target tables have already been truncated this run, so a
/// table shared by two configured namespaces is truncated at most once
/// (§3 "Truncation memo").
#[derive(Debug, Default)]
pub struct TruncationMemo {
    truncated: Mutex<HashSet<String>>,
}

impl TruncationMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a given table is seen (meaning: the
    /// caller should truncate it now), and `false` on every subsequent
    /// call for the same table.
    pub fn mark_if_first(&self, table: &str) -> bool {
        let mut truncated = self.truncated.lock().expect("truncation memo poisoned");
        truncated.insert(table.to_string())
    }
}
