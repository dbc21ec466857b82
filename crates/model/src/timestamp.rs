use bson::Timestamp;
use serde::{Deserialize, Serialize};

/// A monotonic point in the source's oplog, persisted by the tailer
/// between runs. The zero timestamp means "the tailer has never run."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResumeTimestamp {
    pub time: u32,
    pub increment: u32,
}

impl ResumeTimestamp {
    pub const ZERO: ResumeTimestamp = ResumeTimestamp { time: 0, increment: 0 };

    pub fn from_secs(secs: u32) -> Self {
        ResumeTimestamp { time: secs, increment: 0 }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<Timestamp> for ResumeTimestamp {
    fn from(ts: Timestamp) -> Self {
        ResumeTimestamp { time: ts.time, increment: ts.increment }
    }
}

impl From<ResumeTimestamp> for Timestamp {
    fn from(rt: ResumeTimestamp) -> Self {
        Timestamp { time: rt.time, increment: rt.increment }
    }
}
