use crate::namespace::Namespace;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// The one-character opcode MongoDB's oplog uses to tag each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// `n` — no-op, written by the primary as a heartbeat.
    Noop,
    /// `i` — insert.
    Insert,
    /// `u` — update (replacement or mutator; see `Update::kind`).
    Update,
    /// `d` — delete.
    Delete,
    /// Anything else the oplog format may carry (e.g. `c` for commands).
    Unknown(char),
}

impl OpCode {
    pub fn parse(c: char) -> Self {
        match c {
            'n' => OpCode::Noop,
            'i' => OpCode::Insert,
            'u' => OpCode::Update,
            'd' => OpCode::Delete,
            other => OpCode::Unknown(other),
        }
    }
}

/// One record from the source's replication log.
///
/// Ordering within a single oplog stream is preserved by the tailer;
/// this type only carries the fields the interpreter needs (§3).
#[derive(Debug, Clone)]
pub struct OplogEntry {
    pub ns: Option<Namespace>,
    pub op: Option<OpCode>,
    /// The operation's primary payload: the inserted/replaced document,
    /// the mutator spec, or the delete selector.
    pub o: Document,
    /// For updates only: the update selector, always containing `_id`.
    pub o2: Option<Document>,
}

impl OplogEntry {
    /// Parses a raw oplog document (as returned by `local.oplog.rs`) into
    /// the entry shape the interpreter dispatches on. Fields that are
    /// missing or of the wrong BSON type come back as `None`, matching
    /// §4.5's "if `ns` or `op` is missing, log and drop" gating.
    pub fn from_raw(raw: &Document) -> Self {
        let ns = raw
            .get_str("ns")
            .ok()
            .and_then(Namespace::parse);
        let op = raw
            .get_str("op")
            .ok()
            .and_then(|s| s.chars().next())
            .map(OpCode::parse);
        let o = raw
            .get_document("o")
            .cloned()
            .unwrap_or_default();
        let o2 = raw.get_document("o2").cloned().ok();

        OplogEntry { ns, op, o, o2 }
    }

    /// Extracts `_id` from the update selector (`o2`), if present.
    pub fn selector_id(&self) -> Option<&Bson> {
        self.o2.as_ref().and_then(|sel| sel.get("_id"))
    }

    /// A mutator update has at least one top-level key of `o` beginning
    /// with `$` (e.g. `$set`, `$inc`). The post-image is not recoverable
    /// from the oplog alone in that case.
    pub fn is_mutator_update(&self) -> bool {
        self.o.keys().any(|k| k.starts_with('$'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn drops_entries_missing_ns_or_op() {
        let raw = doc! { "o": { "x": 1 } };
        let entry = OplogEntry::from_raw(&raw);
        assert!(entry.ns.is_none());
        assert!(entry.op.is_none());
    }

    #[test]
    fn classifies_mutator_vs_replacement() {
        let mutator = OplogEntry::from_raw(&doc! {
            "ns": "d.c", "op": "u",
            "o2": { "_id": 42 },
            "o": { "$set": { "n": 1 } },
        });
        assert!(mutator.is_mutator_update());

        let replacement = OplogEntry::from_raw(&doc! {
            "ns": "d.c", "op": "u",
            "o2": { "_id": 42 },
            "o": { "name": "x" },
        });
        assert!(!replacement.is_mutator_update());
    }

    #[test]
    fn reads_selector_id() {
        let entry = OplogEntry::from_raw(&doc! {
            "ns": "d.c", "op": "u",
            "o2": { "_id": 42 },
            "o": { "name": "x" },
        });
        assert_eq!(entry.selector_id(), Some(&Bson::Int32(42)));
    }
}
