use serde::{Deserialize, Serialize};
use std::fmt;

/// A `<database>.<collection>` pair — the key identifying one logical
/// data stream from source to target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    raw: String,
    split_at: usize,
}

impl Namespace {
    pub fn parse(ns: &str) -> Option<Self> {
        let split_at = ns.find('.')?;
        if split_at == 0 || split_at == ns.len() - 1 {
            return None;
        }
        Some(Self {
            raw: ns.to_string(),
            split_at,
        })
    }

    pub fn database(&self) -> &str {
        &self.raw[..self.split_at]
    }

    pub fn collection(&self) -> &str {
        &self.raw[self.split_at + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True for the pseudo-collection MongoDB uses to record index builds
    /// in the oplog (`db.system.indexes`).
    pub fn is_system_indexes(&self) -> bool {
        self.collection() == "system.indexes"
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
